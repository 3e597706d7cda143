use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;

use crate::collab::{NoticeKind, Notifier, ResourceStore, RoleSource};
use crate::error::StoreError;
use crate::geo::{Bounds, LatLng};
use crate::markers::{MapSurface, MarkerLabel};
use crate::models::{CoordValue, Resource, ResourceFields, ResourceStatus, ResourceType, Role};

/// An available shelter with textual coordinates, as imported rows carry them.
pub fn resource(id: &str, latitude: &str, longitude: &str) -> Resource {
    Resource {
        id: id.to_string(),
        title: format!("Resource {id}"),
        resource_type: ResourceType::Shelter,
        status: ResourceStatus::Available,
        location_name: "Downtown".to_string(),
        description: None,
        latitude: Some(CoordValue::from(latitude)),
        longitude: Some(CoordValue::from(longitude)),
        address: None,
        contact_name: None,
        contact_phone: None,
        contact_email: None,
        capacity: None,
        current_occupancy: None,
        notes: None,
        created_by: None,
        created_at: String::new(),
        updated_at: String::new(),
    }
}

/// A valid create/update payload.
pub fn fields(title: &str) -> ResourceFields {
    ResourceFields {
        title: title.to_string(),
        resource_type: ResourceType::Shelter,
        status: ResourceStatus::Available,
        location_name: "Town Hall".to_string(),
        latitude: 44.97,
        longitude: -93.26,
        address: None,
        contact_name: None,
        contact_phone: None,
        contact_email: None,
        capacity: None,
        current_occupancy: None,
        description: None,
        notes: None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapCall {
    SetViewport {
        center: LatLng,
        zoom: f64,
        animate: bool,
    },
    FitBounds {
        bounds: Bounds,
        padding: f64,
        max_zoom: f64,
    },
    AddMarker {
        marker: u32,
        at: LatLng,
        title: String,
    },
    RemoveMarker(u32),
    OpenPopup(u32),
}

/// A map that records every call and tracks which markers are live.
#[derive(Default)]
pub struct RecordingMap {
    next_marker: u32,
    live: HashMap<u32, LatLng>,
    handlers: HashMap<u32, Box<dyn Fn()>>,
    calls: Vec<MapCall>,
}

impl RecordingMap {
    pub fn calls(&self) -> &[MapCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn fit_calls(&self) -> Vec<(Bounds, f64, f64)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                MapCall::FitBounds {
                    bounds,
                    padding,
                    max_zoom,
                } => Some((*bounds, *padding, *max_zoom)),
                _ => None,
            })
            .collect()
    }

    pub fn opened_popups(&self) -> Vec<u32> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                MapCall::OpenPopup(m) => Some(*m),
                _ => None,
            })
            .collect()
    }

    /// Simulate a user click on a live marker.
    pub fn click(&self, marker: u32) {
        if let Some(handler) = self.handlers.get(&marker) {
            handler();
        }
    }
}

impl MapSurface for RecordingMap {
    type Marker = u32;

    fn set_viewport(&mut self, center: LatLng, zoom: f64, animate: bool) {
        self.calls.push(MapCall::SetViewport {
            center,
            zoom,
            animate,
        });
    }

    fn fit_bounds(&mut self, bounds: Bounds, padding: f64, max_zoom: f64) {
        self.calls.push(MapCall::FitBounds {
            bounds,
            padding,
            max_zoom,
        });
    }

    fn add_marker(&mut self, at: LatLng, label: &MarkerLabel) -> u32 {
        self.next_marker += 1;
        let marker = self.next_marker;
        self.live.insert(marker, at);
        self.calls.push(MapCall::AddMarker {
            marker,
            at,
            title: label.title.clone(),
        });
        marker
    }

    fn remove_marker(&mut self, marker: &u32) {
        self.live.remove(marker);
        self.handlers.remove(marker);
        self.calls.push(MapCall::RemoveMarker(*marker));
    }

    fn on_marker_click(&mut self, marker: &u32, callback: Box<dyn Fn()>) {
        self.handlers.insert(*marker, callback);
    }

    fn open_popup(&mut self, marker: &u32) {
        self.calls.push(MapCall::OpenPopup(*marker));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    List,
    Create,
    Update,
    Delete,
    Role,
}

#[derive(Default)]
struct MemoryInner {
    resources: Vec<Resource>,
    roles: HashMap<String, Role>,
    failures: HashMap<StoreOp, String>,
    next_id: u32,
    clock: u32,
}

impl MemoryInner {
    fn check(&mut self, op: StoreOp) -> Result<(), StoreError> {
        match self.failures.remove(&op) {
            Some(message) => Err(StoreError::Rejected(message)),
            None => Ok(()),
        }
    }

    fn tick(&mut self) -> String {
        self.clock += 1;
        format!("2024-01-01T00:00:{:02}Z", self.clock % 60)
    }
}

/// Store and role source backed by a shared `Vec`. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemoryStore {
    pub fn with_resources(resources: Vec<Resource>) -> Self {
        let store = MemoryStore::default();
        store.inner.borrow_mut().resources = resources;
        store
    }

    /// Put a resource at the front, as the newest.
    pub fn insert(&self, resource: Resource) {
        self.inner.borrow_mut().resources.insert(0, resource);
    }

    pub fn set_role(&self, user_id: &str, role: Role) {
        self.inner
            .borrow_mut()
            .roles
            .insert(user_id.to_string(), role);
    }

    /// Make the next call of kind `op` fail with `message`.
    pub fn fail_next(&self, op: StoreOp, message: &str) {
        self.inner
            .borrow_mut()
            .failures
            .insert(op, message.to_string());
    }

    pub fn snapshot(&self) -> Vec<Resource> {
        self.inner.borrow().resources.clone()
    }
}

#[async_trait(?Send)]
impl ResourceStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Resource>, StoreError> {
        let mut inner = self.inner.borrow_mut();
        inner.check(StoreOp::List)?;
        Ok(inner.resources.clone())
    }

    async fn create(
        &self,
        fields: ResourceFields,
        created_by: Option<&str>,
    ) -> Result<Resource, StoreError> {
        let mut inner = self.inner.borrow_mut();
        inner.check(StoreOp::Create)?;
        let fields = fields.validate()?;
        inner.next_id += 1;
        let id = format!("res-{}", inner.next_id);
        let now = inner.tick();
        let resource = Resource::from_fields(id, fields, created_by.map(str::to_string), &now);
        inner.resources.insert(0, resource.clone());
        Ok(resource)
    }

    async fn update(&self, id: &str, fields: ResourceFields) -> Result<Resource, StoreError> {
        let mut inner = self.inner.borrow_mut();
        inner.check(StoreOp::Update)?;
        let fields = fields.validate()?;
        let now = inner.tick();
        let existing = inner
            .resources
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        existing.apply(fields, &now);
        Ok(existing.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.borrow_mut();
        inner.check(StoreOp::Delete)?;
        let index = inner
            .resources
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        inner.resources.remove(index);
        Ok(())
    }
}

#[async_trait(?Send)]
impl RoleSource for MemoryStore {
    async fn role_of(&self, user_id: &str) -> Result<Role, StoreError> {
        let mut inner = self.inner.borrow_mut();
        inner.check(StoreOp::Role)?;
        Ok(inner.roles.get(user_id).copied().unwrap_or_default())
    }
}

/// Collects every notice in order. Clones share the log.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    notices: Rc<RefCell<Vec<(NoticeKind, String)>>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<(NoticeKind, String)> {
        self.notices.borrow().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, kind: NoticeKind, message: &str) {
        self.notices.borrow_mut().push((kind, message.to_string()));
    }
}
