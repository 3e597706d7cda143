use anyhow::{anyhow, bail, Context, Result};
use relief_shared::models::ResourceFields;
use serde::de::DeserializeOwned;
use serde::Deserialize;

const DEFAULT_GRAPHQL_URL: &str = "http://localhost:3000/graphql";

const USAGE: &str =
    "Usage: cargo run -p relief-seed -- [--file resources.json] [--user USER_ID] [--url URL] [--report]";

const CREATE_MUTATION: &str = "mutation($input: ResourceInput!, $createdBy: String) { \
    createResource(input: $input, createdBy: $createdBy) { id title } }";

const STATS_QUERY: &str = "{ stats { totalResources quarantined dbSizeBytes \
    byType { key count } byStatus { key count } totalCapacity totalOccupancy } }";

// --- GraphQL response types ---

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateData {
    create_resource: Created,
}

#[derive(Deserialize)]
struct Created {
    id: String,
    title: String,
}

#[derive(Deserialize)]
struct StatsData {
    stats: Stats,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Stats {
    total_resources: u64,
    quarantined: u64,
    db_size_bytes: u64,
    by_type: Vec<Count>,
    by_status: Vec<Count>,
    total_capacity: i64,
    total_occupancy: i64,
}

#[derive(Deserialize)]
struct Count {
    key: String,
    count: u64,
}

fn post<T: DeserializeOwned>(
    client: &reqwest::blocking::Client,
    url: &str,
    body: &serde_json::Value,
) -> Result<T> {
    let resp: GraphQlResponse<T> = client
        .post(url)
        .json(body)
        .send()
        .with_context(|| format!("Failed to reach {url}"))?
        .json()
        .context("Failed to parse GraphQL response")?;

    if let Some(err) = resp.errors.into_iter().next() {
        bail!(err.message);
    }
    resp.data.ok_or_else(|| anyhow!("GraphQL response had no data"))
}

/// Parse a seed file: a JSON array of resource payloads. Every entry is
/// validated up front so a bad file creates nothing.
fn parse_seed_file(json: &str) -> Result<Vec<ResourceFields>> {
    let entries: Vec<ResourceFields> =
        serde_json::from_str(json).context("Seed file must be a JSON array of resources")?;
    entries
        .into_iter()
        .enumerate()
        .map(|(i, fields)| {
            let title = fields.title.clone();
            fields
                .validate()
                .with_context(|| format!("Entry {} ({:?}) is invalid", i + 1, title))
        })
        .collect()
}

fn percentage(part: i64, whole: i64) -> i64 {
    if whole <= 0 {
        0
    } else {
        (part as f64 / whole as f64 * 100.0).round() as i64
    }
}

fn format_report(stats: &Stats) -> String {
    let mut out = String::new();

    out.push_str("=== Resources ===\n");
    out.push_str(&format!("  Total:       {}\n", stats.total_resources));
    out.push_str(&format!("  Quarantined: {}\n", stats.quarantined));
    out.push_str(&format!("  Database:    {} KiB\n\n", stats.db_size_bytes / 1024));

    out.push_str("=== By Type ===\n");
    for c in &stats.by_type {
        out.push_str(&format!("  {}: {}\n", c.key, c.count));
    }

    out.push_str("\n=== By Status ===\n");
    for c in &stats.by_status {
        out.push_str(&format!("  {}: {}\n", c.key, c.count));
    }

    out.push_str(&format!(
        "\n=== Occupancy ===\n  {} / {} ({}%)\n",
        stats.total_occupancy,
        stats.total_capacity,
        percentage(stats.total_occupancy, stats.total_capacity)
    ));

    out
}

fn get_arg(flag: &str) -> Option<String> {
    std::env::args().skip_while(|a| a != flag).nth(1)
}

fn has_flag(flag: &str) -> bool {
    std::env::args().any(|a| a == flag)
}

fn run() -> Result<()> {
    let graphql_url = get_arg("--url").unwrap_or_else(|| DEFAULT_GRAPHQL_URL.to_string());
    let user = get_arg("--user");
    let file = get_arg("--file");

    if file.is_none() && !has_flag("--report") {
        bail!("nothing to do, pass --file and/or --report\n{USAGE}");
    }

    let client = reqwest::blocking::Client::new();

    if let Some(path) = file {
        let json =
            std::fs::read_to_string(&path).with_context(|| format!("Failed to read {path}"))?;
        let entries = parse_seed_file(&json)?;
        eprintln!("Creating {} resources at {graphql_url}...", entries.len());

        for fields in entries {
            let body = serde_json::json!({
                "query": CREATE_MUTATION,
                "variables": { "input": fields, "createdBy": user },
            });
            let created: CreateData = post(&client, &graphql_url, &body)
                .with_context(|| format!("Failed to create {:?}", fields.title))?;
            eprintln!(
                "  created {} ({})",
                created.create_resource.title, created.create_resource.id
            );
        }
    }

    if has_flag("--report") {
        eprintln!("Fetching stats from {graphql_url}...");
        let body = serde_json::json!({ "query": STATS_QUERY });
        let data: StatsData = post(&client, &graphql_url, &body)?;
        print!("{}", format_report(&data.stats));
    }

    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relief_shared::models::{ResourceStatus, ResourceType};

    #[test]
    fn test_parse_seed_file() {
        let json = r#"[
            {"title": "Central Gym", "resourceType": "shelter", "status": "available",
             "locationName": "Lincoln High", "latitude": 44.97, "longitude": -93.26,
             "capacity": 200, "contactPhone": ""},
            {"title": "Pantry", "resourceType": "food", "status": "limited",
             "locationName": "St. Mark's", "latitude": 44.9, "longitude": -93.1}
        ]"#;
        let entries = parse_seed_file(json).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].capacity, Some(200));
        assert_eq!(entries[0].contact_phone, None);
        assert_eq!(entries[1].resource_type, ResourceType::Food);
        assert_eq!(entries[1].status, ResourceStatus::Limited);
        assert_eq!(entries[1].current_occupancy, Some(0));
    }

    #[test]
    fn test_parse_seed_file_rejects_invalid_entry() {
        let json = r#"[
            {"title": "Ok", "resourceType": "medical", "status": "available",
             "locationName": "Clinic", "latitude": 1, "longitude": 2},
            {"title": "", "resourceType": "medical", "status": "available",
             "locationName": "Clinic", "latitude": 1, "longitude": 2}
        ]"#;
        let err = parse_seed_file(json).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("Entry 2"), "{message}");
        assert!(message.contains("title is required"), "{message}");
    }

    #[test]
    fn test_parse_seed_file_rejects_unknown_type() {
        let json = r#"[{"title": "X", "resourceType": "hotel", "status": "available",
             "locationName": "Y", "latitude": 1, "longitude": 2}]"#;
        assert!(parse_seed_file(json).is_err());
    }

    #[test]
    fn test_format_report() {
        let stats = Stats {
            total_resources: 3,
            quarantined: 1,
            db_size_bytes: 20480,
            by_type: vec![
                Count {
                    key: "food".into(),
                    count: 1,
                },
                Count {
                    key: "shelter".into(),
                    count: 2,
                },
            ],
            by_status: vec![Count {
                key: "available".into(),
                count: 3,
            }],
            total_capacity: 300,
            total_occupancy: 100,
        };
        let report = format_report(&stats);
        assert!(report.contains("Total:       3\n"));
        assert!(report.contains("Quarantined: 1\n"));
        assert!(report.contains("Database:    20 KiB\n"));
        assert!(report.contains("  shelter: 2\n"));
        assert!(report.contains("  available: 3\n"));
        assert!(report.contains("  100 / 300 (33%)\n"));
    }

    #[test]
    fn test_percentage_without_capacity() {
        assert_eq!(percentage(5, 0), 0);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
    }
}
