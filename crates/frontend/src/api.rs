use async_trait::async_trait;
use relief_shared::collab::{ResourceStore, RoleSource};
use relief_shared::models::{Resource, ResourceFields, Role};
use relief_shared::StoreError;
use serde::{Deserialize, Serialize};

/// Selection set shared by every query returning resources.
const RESOURCE_FIELDS: &str = "id title resourceType status locationName description \
    latitude longitude address contactName contactPhone contactEmail capacity \
    currentOccupancy notes createdBy createdAt updatedAt";

/// Build the variables JSON for a create mutation.
pub fn build_create_variables(fields: &ResourceFields, created_by: Option<&str>) -> serde_json::Value {
    serde_json::json!({
        "input": fields,
        "createdBy": created_by,
    })
}

/// Build the variables JSON for an update mutation.
pub fn build_update_variables(id: &str, fields: &ResourceFields) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "input": fields,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphQLRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLResponse<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<GraphQLError>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLError {
    pub message: String,
}

impl<T> GraphQLResponse<T> {
    /// The data, or the first error message as a rejection.
    fn into_result(self) -> Result<T, StoreError> {
        if let Some(error) = self.errors.and_then(|e| e.into_iter().next()) {
            return Err(StoreError::Rejected(error.message));
        }
        self.data
            .ok_or_else(|| StoreError::Decode("No data returned".to_string()))
    }
}

#[derive(Deserialize)]
pub struct ResourcesResponse {
    pub resources: Vec<Resource>,
}

#[derive(Deserialize)]
pub struct CreateResourceResponse {
    #[serde(rename = "createResource")]
    pub create_resource: Resource,
}

#[derive(Deserialize)]
pub struct UpdateResourceResponse {
    #[serde(rename = "updateResource")]
    pub update_resource: Resource,
}

#[derive(Deserialize)]
pub struct DeleteResourceResponse {
    #[serde(rename = "deleteResource")]
    pub delete_resource: bool,
}

#[derive(Deserialize)]
pub struct UserRoleResponse {
    #[serde(rename = "userRole")]
    pub user_role: Role,
}

/// The resource store and role lookup, served by the backend's GraphQL API.
#[derive(Debug, Clone)]
pub struct GraphqlStore {
    endpoint: String,
}

impl GraphqlStore {
    pub fn new(endpoint: impl Into<String>) -> Self {
        GraphqlStore {
            endpoint: endpoint.into(),
        }
    }

    /// The API on the page's own origin.
    pub fn same_origin() -> Self {
        let origin = web_sys::window()
            .and_then(|w| w.location().origin().ok())
            .unwrap_or_else(|| "http://localhost:3000".to_string());
        Self::new(format!("{}/graphql", origin))
    }

    async fn query<T: for<'de> Deserialize<'de>>(
        &self,
        query_str: &str,
        variables: Option<serde_json::Value>,
    ) -> Result<T, StoreError> {
        let req = GraphQLRequest {
            query: query_str.to_string(),
            variables,
        };

        let resp = reqwest::Client::new()
            .post(&self.endpoint)
            .json(&req)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let gql_resp: GraphQLResponse<T> = resp
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        gql_resp.into_result()
    }
}

#[async_trait(?Send)]
impl ResourceStore for GraphqlStore {
    async fn list(&self) -> Result<Vec<Resource>, StoreError> {
        let resp: ResourcesResponse = self
            .query(&format!("query {{ resources {{ {RESOURCE_FIELDS} }} }}"), None)
            .await?;
        Ok(resp.resources)
    }

    async fn create(
        &self,
        fields: ResourceFields,
        created_by: Option<&str>,
    ) -> Result<Resource, StoreError> {
        let resp: CreateResourceResponse = self
            .query(
                &format!(
                    "mutation CreateResource($input: ResourceInput!, $createdBy: String) {{
                        createResource(input: $input, createdBy: $createdBy) {{ {RESOURCE_FIELDS} }}
                    }}"
                ),
                Some(build_create_variables(&fields, created_by)),
            )
            .await?;
        Ok(resp.create_resource)
    }

    async fn update(&self, id: &str, fields: ResourceFields) -> Result<Resource, StoreError> {
        let resp: UpdateResourceResponse = self
            .query(
                &format!(
                    "mutation UpdateResource($id: ID!, $input: ResourceInput!) {{
                        updateResource(id: $id, input: $input) {{ {RESOURCE_FIELDS} }}
                    }}"
                ),
                Some(build_update_variables(id, &fields)),
            )
            .await?;
        Ok(resp.update_resource)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let resp: DeleteResourceResponse = self
            .query(
                "mutation DeleteResource($id: ID!) { deleteResource(id: $id) }",
                Some(serde_json::json!({ "id": id })),
            )
            .await?;
        if resp.delete_resource {
            Ok(())
        } else {
            Err(StoreError::NotFound(id.to_string()))
        }
    }
}

#[async_trait(?Send)]
impl RoleSource for GraphqlStore {
    async fn role_of(&self, user_id: &str) -> Result<Role, StoreError> {
        let resp: UserRoleResponse = self
            .query(
                "query UserRole($userId: String!) { userRole(userId: $userId) }",
                Some(serde_json::json!({ "userId": user_id })),
            )
            .await?;
        Ok(resp.user_role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relief_shared::models::{ResourceStatus, ResourceType};

    fn fields() -> ResourceFields {
        ResourceFields {
            title: "Central Gym".to_string(),
            resource_type: ResourceType::Shelter,
            status: ResourceStatus::Limited,
            location_name: "Lincoln High".to_string(),
            latitude: 44.97,
            longitude: -93.26,
            address: None,
            contact_name: Some("Dana".to_string()),
            contact_phone: None,
            contact_email: None,
            capacity: Some(200),
            current_occupancy: Some(150),
            description: None,
            notes: None,
        }
    }

    // --- GraphQL request serialization ---

    #[test]
    fn test_graphql_request_omits_null_variables() {
        let req = GraphQLRequest {
            query: "query { resources { id } }".to_string(),
            variables: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("variables").is_none());
    }

    #[test]
    fn test_create_variables_use_schema_names() {
        let vars = build_create_variables(&fields(), Some("u1"));
        assert_eq!(vars["createdBy"], "u1");
        let input = &vars["input"];
        assert_eq!(input["resourceType"], "shelter");
        assert_eq!(input["status"], "limited");
        assert_eq!(input["locationName"], "Lincoln High");
        assert_eq!(input["currentOccupancy"], 150);
        assert_eq!(input["contactName"], "Dana");
        assert!(input["address"].is_null());
    }

    #[test]
    fn test_create_variables_without_user() {
        let vars = build_create_variables(&fields(), None);
        assert!(vars["createdBy"].is_null());
    }

    #[test]
    fn test_update_variables_carry_id() {
        let vars = build_update_variables("abc", &fields());
        assert_eq!(vars["id"], "abc");
        assert_eq!(vars["input"]["title"], "Central Gym");
    }

    // --- Response deserialization ---

    #[test]
    fn test_resources_response_deserializes() {
        let json = r#"{"resources":[
            {"id":"1","title":"Gym","resourceType":"shelter","status":"available",
             "locationName":"School","description":null,"latitude":44.9,"longitude":-93.2,
             "capacity":100,"currentOccupancy":20,"createdAt":"2024-05-01T10:00:00+00:00",
             "updatedAt":"2024-05-01T10:00:00+00:00"},
            {"id":"2","title":"Depot","resourceType":"logistics","status":"limited",
             "locationName":"Rail yard","latitude":null,"longitude":null}
        ]}"#;
        let resp: ResourcesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.resources.len(), 2);
        assert_eq!(resp.resources[0].occupancy_percentage(), 20);
        assert!(resp.resources[0].position().is_some());
        assert!(resp.resources[1].position().is_none());
    }

    #[test]
    fn test_user_role_response_deserializes() {
        let resp: UserRoleResponse = serde_json::from_str(r#"{"userRole":"volunteer"}"#).unwrap();
        assert_eq!(resp.user_role, Role::Volunteer);
    }

    #[test]
    fn test_errors_become_rejections() {
        let resp: GraphQLResponse<DeleteResourceResponse> =
            serde_json::from_str(r#"{"data":null,"errors":[{"message":"title is required"}]}"#)
                .unwrap();
        assert_eq!(
            resp.into_result().err(),
            Some(StoreError::Rejected("title is required".to_string()))
        );
    }

    #[test]
    fn test_missing_data_is_a_decode_error() {
        let resp: GraphQLResponse<DeleteResourceResponse> =
            serde_json::from_str(r#"{"data":null}"#).unwrap();
        assert!(matches!(resp.into_result(), Err(StoreError::Decode(_))));
    }
}
