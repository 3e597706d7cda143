use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::Arc;

use async_graphql::{Context, Enum, InputObject, Object, SimpleObject, ID};
use relief_shared::models::{
    self, Resource, ResourceFields, ResourceStatus, ResourceType, Role,
};

use crate::storage::Storage;

fn gql_error(e: impl Display) -> async_graphql::Error {
    async_graphql::Error::new(e.to_string())
}

// Enums keep the lowercase names used in storage and filter selects

#[derive(Enum, Copy, Clone, Eq, PartialEq)]
#[graphql(name = "ResourceType", rename_items = "lowercase")]
pub enum GqlResourceType {
    Shelter,
    Food,
    Medical,
    Logistics,
}

impl From<ResourceType> for GqlResourceType {
    fn from(t: ResourceType) -> Self {
        match t {
            ResourceType::Shelter => GqlResourceType::Shelter,
            ResourceType::Food => GqlResourceType::Food,
            ResourceType::Medical => GqlResourceType::Medical,
            ResourceType::Logistics => GqlResourceType::Logistics,
        }
    }
}

impl From<GqlResourceType> for ResourceType {
    fn from(t: GqlResourceType) -> Self {
        match t {
            GqlResourceType::Shelter => ResourceType::Shelter,
            GqlResourceType::Food => ResourceType::Food,
            GqlResourceType::Medical => ResourceType::Medical,
            GqlResourceType::Logistics => ResourceType::Logistics,
        }
    }
}

#[derive(Enum, Copy, Clone, Eq, PartialEq)]
#[graphql(name = "ResourceStatus", rename_items = "lowercase")]
pub enum GqlResourceStatus {
    Available,
    Limited,
    Unavailable,
}

impl From<ResourceStatus> for GqlResourceStatus {
    fn from(s: ResourceStatus) -> Self {
        match s {
            ResourceStatus::Available => GqlResourceStatus::Available,
            ResourceStatus::Limited => GqlResourceStatus::Limited,
            ResourceStatus::Unavailable => GqlResourceStatus::Unavailable,
        }
    }
}

impl From<GqlResourceStatus> for ResourceStatus {
    fn from(s: GqlResourceStatus) -> Self {
        match s {
            GqlResourceStatus::Available => ResourceStatus::Available,
            GqlResourceStatus::Limited => ResourceStatus::Limited,
            GqlResourceStatus::Unavailable => ResourceStatus::Unavailable,
        }
    }
}

#[derive(Enum, Copy, Clone, Eq, PartialEq)]
#[graphql(name = "Role", rename_items = "lowercase")]
pub enum GqlRole {
    Public,
    Volunteer,
    Admin,
}

impl From<Role> for GqlRole {
    fn from(r: Role) -> Self {
        match r {
            Role::Public => GqlRole::Public,
            Role::Volunteer => GqlRole::Volunteer,
            Role::Admin => GqlRole::Admin,
        }
    }
}

// GraphQL output types

#[derive(SimpleObject)]
#[graphql(name = "Resource")]
pub struct GqlResource {
    pub id: ID,
    pub title: String,
    pub resource_type: GqlResourceType,
    pub status: GqlResourceStatus,
    pub location_name: String,
    pub description: Option<String>,
    /// Null when the stored value is missing or not a finite number.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub capacity: Option<i64>,
    pub current_occupancy: Option<i64>,
    pub notes: Option<String>,
    pub created_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Resource> for GqlResource {
    fn from(r: Resource) -> Self {
        GqlResource {
            id: ID(r.id),
            title: r.title,
            resource_type: r.resource_type.into(),
            status: r.status.into(),
            location_name: r.location_name,
            description: r.description,
            latitude: r.latitude.as_ref().and_then(models::CoordValue::parse),
            longitude: r.longitude.as_ref().and_then(models::CoordValue::parse),
            address: r.address,
            contact_name: r.contact_name,
            contact_phone: r.contact_phone,
            contact_email: r.contact_email,
            capacity: r.capacity,
            current_occupancy: r.current_occupancy,
            notes: r.notes,
            created_by: r.created_by,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(SimpleObject)]
pub struct GqlCount {
    pub key: String,
    pub count: u64,
}

#[derive(SimpleObject)]
pub struct GqlStats {
    pub total_resources: u64,
    /// Stored rows that no longer decode and are left out of every listing.
    pub quarantined: u64,
    pub db_size_bytes: u64,
    pub by_type: Vec<GqlCount>,
    pub by_status: Vec<GqlCount>,
    pub total_capacity: i64,
    pub total_occupancy: i64,
}

// Input types

#[derive(InputObject)]
pub struct ResourceInput {
    pub title: String,
    pub resource_type: GqlResourceType,
    pub status: GqlResourceStatus,
    pub location_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub capacity: Option<i64>,
    pub current_occupancy: Option<i64>,
    pub description: Option<String>,
    pub notes: Option<String>,
}

impl ResourceInput {
    fn into_fields(self) -> async_graphql::Result<ResourceFields> {
        ResourceFields {
            title: self.title,
            resource_type: self.resource_type.into(),
            status: self.status.into(),
            location_name: self.location_name,
            latitude: self.latitude,
            longitude: self.longitude,
            address: self.address,
            contact_name: self.contact_name,
            contact_phone: self.contact_phone,
            contact_email: self.contact_email,
            capacity: self.capacity,
            current_occupancy: self.current_occupancy,
            description: self.description,
            notes: self.notes,
        }
        .validate()
        .map_err(gql_error)
    }
}

fn count_by<K: Display>(keys: impl Iterator<Item = K>) -> Vec<GqlCount> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for key in keys {
        *counts.entry(key.to_string()).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(key, count)| GqlCount { key, count })
        .collect()
}

// Query root

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Every resource, newest first.
    async fn resources(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<GqlResource>> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let listing = storage.list_resources().map_err(gql_error)?;
        Ok(listing.resources.into_iter().map(GqlResource::from).collect())
    }

    async fn resource(
        &self,
        ctx: &Context<'_>,
        id: ID,
    ) -> async_graphql::Result<Option<GqlResource>> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let resource = storage.get_resource(&id).map_err(gql_error)?;
        Ok(resource.map(GqlResource::from))
    }

    /// Role of a user; unknown users are public.
    async fn user_role(&self, ctx: &Context<'_>, user_id: String) -> async_graphql::Result<GqlRole> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let role = storage.role_of(&user_id).map_err(gql_error)?;
        Ok(role.into())
    }

    async fn stats(&self, ctx: &Context<'_>) -> async_graphql::Result<GqlStats> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let listing = storage.list_resources().map_err(gql_error)?;
        let db_size_bytes = storage.db_size_bytes().map_err(gql_error)?;

        let resources = &listing.resources;
        Ok(GqlStats {
            total_resources: resources.len() as u64,
            quarantined: listing.quarantined as u64,
            db_size_bytes,
            by_type: count_by(resources.iter().map(|r| r.resource_type.as_str())),
            by_status: count_by(resources.iter().map(|r| r.status.as_str())),
            total_capacity: resources.iter().filter_map(|r| r.capacity).sum(),
            total_occupancy: resources.iter().filter_map(|r| r.current_occupancy).sum(),
        })
    }
}

// Mutation root

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn create_resource(
        &self,
        ctx: &Context<'_>,
        input: ResourceInput,
        created_by: Option<String>,
    ) -> async_graphql::Result<GqlResource> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let fields = input.into_fields()?;
        let now = chrono::Utc::now().to_rfc3339();

        let resource = Resource::from_fields(models::new_resource_id(), fields, created_by, &now);
        storage.put_resource(&resource).map_err(gql_error)?;

        tracing::info!(id = %resource.id, title = %resource.title, "Created resource");
        Ok(GqlResource::from(resource))
    }

    async fn update_resource(
        &self,
        ctx: &Context<'_>,
        id: ID,
        input: ResourceInput,
    ) -> async_graphql::Result<GqlResource> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let fields = input.into_fields()?;

        let mut resource = storage
            .get_resource(&id)
            .map_err(gql_error)?
            .ok_or_else(|| async_graphql::Error::new("Resource not found"))?;
        resource.apply(fields, &chrono::Utc::now().to_rfc3339());
        storage.put_resource(&resource).map_err(gql_error)?;

        tracing::info!(id = %resource.id, "Updated resource");
        Ok(GqlResource::from(resource))
    }

    /// False when no resource had that id.
    async fn delete_resource(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<bool> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let removed = storage.delete_resource(&id).map_err(gql_error)?;
        tracing::info!(id = %id.as_str(), removed, "Deleted resource");
        Ok(removed)
    }
}

pub type Schema = async_graphql::Schema<QueryRoot, MutationRoot, async_graphql::EmptySubscription>;

pub fn build_schema(storage: Arc<Storage>) -> Schema {
    async_graphql::Schema::build(QueryRoot, MutationRoot, async_graphql::EmptySubscription)
        .data(storage)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn schema() -> (tempfile::TempDir, Arc<Storage>, Schema) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(&dir.path().join("test.redb")).unwrap();
        let schema = build_schema(storage.clone());
        (dir, storage, schema)
    }

    async fn run(schema: &Schema, query: &str) -> Value {
        let resp = schema.execute(query).await;
        assert!(resp.errors.is_empty(), "unexpected errors: {:?}", resp.errors);
        resp.data.into_json().unwrap()
    }

    const CREATE_GYM: &str = r#"mutation {
        createResource(
            input: {
                title: "Central Gym"
                resourceType: shelter
                status: available
                locationName: "Lincoln High"
                latitude: 44.97
                longitude: -93.26
                capacity: 200
                contactPhone: "  "
            }
            createdBy: "u1"
        ) { id title resourceType status currentOccupancy contactPhone createdBy }
    }"#;

    #[tokio::test]
    async fn test_create_then_list() {
        let (_dir, _storage, schema) = schema();
        let created = run(&schema, CREATE_GYM).await;
        let created = &created["createResource"];
        assert_eq!(created["title"], "Central Gym");
        assert_eq!(created["resourceType"], "shelter");
        assert_eq!(created["status"], "available");
        assert_eq!(created["currentOccupancy"], 0);
        assert_eq!(created["contactPhone"], Value::Null);
        assert_eq!(created["createdBy"], "u1");

        let listed = run(&schema, "{ resources { id latitude longitude } }").await;
        let listed = listed["resources"].as_array().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["id"], created["id"]);
        assert_eq!(listed[0]["latitude"], json!(44.97));
    }

    #[tokio::test]
    async fn test_blank_title_is_rejected() {
        let (_dir, storage, schema) = schema();
        let resp = schema
            .execute(
                r#"mutation { createResource(input: {
                    title: "  ", resourceType: food, status: limited,
                    locationName: "Church", latitude: 1.0, longitude: 2.0
                }) { id } }"#,
            )
            .await;
        assert_eq!(resp.errors.len(), 1);
        assert_eq!(resp.errors[0].message, "title is required");
        assert_eq!(storage.count_resources().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_negative_capacity_is_rejected() {
        let (_dir, _storage, schema) = schema();
        let resp = schema
            .execute(
                r#"mutation { createResource(input: {
                    title: "Pantry", resourceType: food, status: limited,
                    locationName: "Church", latitude: 1.0, longitude: 2.0, capacity: -5
                }) { id } }"#,
            )
            .await;
        assert_eq!(resp.errors[0].message, "capacity cannot be negative");
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (_dir, _storage, schema) = schema();
        let created = run(&schema, CREATE_GYM).await;
        let id = created["createResource"]["id"].as_str().unwrap().to_string();

        let updated = run(
            &schema,
            &format!(
                r#"mutation {{ updateResource(id: "{id}", input: {{
                    title: "Central Gym", resourceType: shelter, status: unavailable,
                    locationName: "Lincoln High", latitude: 44.97, longitude: -93.26
                }}) {{ status createdBy }} }}"#
            ),
        )
        .await;
        assert_eq!(updated["updateResource"]["status"], "unavailable");
        assert_eq!(updated["updateResource"]["createdBy"], "u1");

        let deleted = run(&schema, &format!(r#"mutation {{ deleteResource(id: "{id}") }}"#)).await;
        assert_eq!(deleted["deleteResource"], true);
        let again = run(&schema, &format!(r#"mutation {{ deleteResource(id: "{id}") }}"#)).await;
        assert_eq!(again["deleteResource"], false);

        let one = run(&schema, &format!(r#"{{ resource(id: "{id}") {{ id }} }}"#)).await;
        assert_eq!(one["resource"], Value::Null);
    }

    #[tokio::test]
    async fn test_update_missing_resource_errors() {
        let (_dir, _storage, schema) = schema();
        let resp = schema
            .execute(
                r#"mutation { updateResource(id: "nope", input: {
                    title: "X", resourceType: medical, status: available,
                    locationName: "Y", latitude: 0.0, longitude: 0.0
                }) { id } }"#,
            )
            .await;
        assert_eq!(resp.errors[0].message, "Resource not found");
    }

    #[tokio::test]
    async fn test_roles() {
        let (_dir, storage, schema) = schema();
        let unknown = run(&schema, r#"{ userRole(userId: "u9") }"#).await;
        assert_eq!(unknown["userRole"], "public");

        storage.set_role("u9", Role::Volunteer).unwrap();
        let known = run(&schema, r#"{ userRole(userId: "u9") }"#).await;
        assert_eq!(known["userRole"], "volunteer");
    }

    #[tokio::test]
    async fn test_roles_cannot_be_assigned_over_the_api() {
        let (_dir, storage, schema) = schema();
        let resp = schema
            .execute(r#"mutation { assignRole(userId: "u9", role: admin) }"#)
            .await;
        assert!(!resp.errors.is_empty());
        assert_eq!(storage.role_of("u9").unwrap(), Role::Public);
    }

    #[tokio::test]
    async fn test_stats() {
        let (_dir, _storage, schema) = schema();
        run(&schema, CREATE_GYM).await;
        run(&schema, CREATE_GYM).await;
        run(
            &schema,
            r#"mutation { createResource(input: {
                title: "Clinic", resourceType: medical, status: limited,
                locationName: "Fairgrounds", latitude: 1.0, longitude: 1.0,
                capacity: 10, currentOccupancy: 4
            }) { id } }"#,
        )
        .await;

        let stats = run(
            &schema,
            "{ stats { totalResources quarantined byType { key count } byStatus { key count } totalCapacity totalOccupancy } }",
        )
        .await;
        let stats = &stats["stats"];
        assert_eq!(stats["totalResources"], 3);
        assert_eq!(stats["quarantined"], 0);
        assert_eq!(
            stats["byType"],
            json!([{"key": "medical", "count": 1}, {"key": "shelter", "count": 2}])
        );
        assert_eq!(
            stats["byStatus"],
            json!([{"key": "available", "count": 2}, {"key": "limited", "count": 1}])
        );
        assert_eq!(stats["totalCapacity"], 410);
        assert_eq!(stats["totalOccupancy"], 4);
    }
}
