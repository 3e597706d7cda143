use tokio_util::sync::CancellationToken;

use crate::collab::{NoticeKind, Notifier, ResourceStore, RoleSource};
use crate::error::StoreError;
use crate::filter::{filter, Choice, FilterState};
use crate::models::{Resource, ResourceFields, ResourceStatus, ResourceType, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Grid,
    Map,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum FormMode {
    #[default]
    Closed,
    Creating,
    Editing(Resource),
}

/// Who is acting on the dashboard.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Actor {
    pub user_id: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SignedIn(Option<String>),
    /// Role looked up for `user_id`. Dropped unless that user is still the
    /// one signed in.
    RoleResolved { user_id: String, role: Role },
    RefreshStarted,
    RefreshLoaded(Vec<Resource>),
    RefreshFailed,
    RefreshCancelled,
    SetQuery(String),
    SetTypeFilter(Choice<ResourceType>),
    SetStatusFilter(Choice<ResourceStatus>),
    /// "View on map" on a card, or a marker click.
    Select(String),
    ClearSelection,
    ShowTab(Tab),
    OpenCreate,
    OpenEdit(Resource),
    CloseForm,
    RequestDelete(Resource),
    CancelDelete,
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::SignedIn(_) => "signed_in",
            Action::RoleResolved { .. } => "role_resolved",
            Action::RefreshStarted => "refresh_started",
            Action::RefreshLoaded(_) => "refresh_loaded",
            Action::RefreshFailed => "refresh_failed",
            Action::RefreshCancelled => "refresh_cancelled",
            Action::SetQuery(_) => "set_query",
            Action::SetTypeFilter(_) => "set_type_filter",
            Action::SetStatusFilter(_) => "set_status_filter",
            Action::Select(_) => "select",
            Action::ClearSelection => "clear_selection",
            Action::ShowTab(_) => "show_tab",
            Action::OpenCreate => "open_create",
            Action::OpenEdit(_) => "open_edit",
            Action::CloseForm => "close_form",
            Action::RequestDelete(_) => "request_delete",
            Action::CancelDelete => "cancel_delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    resources: Vec<Resource>,
    filter: FilterState,
    visible: Vec<Resource>,
    selected_id: Option<String>,
    loading: bool,
    actor: Actor,
    form: FormMode,
    pending_delete: Option<Resource>,
    tab: Tab,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            resources: Vec::new(),
            filter: FilterState::default(),
            visible: Vec::new(),
            selected_id: None,
            loading: true,
            actor: Actor::default(),
            form: FormMode::Closed,
            pending_delete: None,
            tab: Tab::Grid,
        }
    }
}

impl ViewState {
    /// The canonical collection, newest first.
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    /// The filtered subset shown in the grid and on the map.
    pub fn visible(&self) -> &[Resource] {
        &self.visible
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn form(&self) -> &FormMode {
        &self.form
    }

    pub fn pending_delete(&self) -> Option<&Resource> {
        self.pending_delete.as_ref()
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn can_create(&self) -> bool {
        self.actor.user_id.is_some()
    }

    fn refilter(&mut self) {
        self.visible = filter(&self.resources, &self.filter);
    }

    /// Drop any open dialog the current actor may no longer use.
    fn enforce_permissions(&mut self) {
        let allowed = match &self.form {
            FormMode::Closed => true,
            FormMode::Creating => self.can_create(),
            FormMode::Editing(_) => self.actor.role.can_edit(),
        };
        if !allowed {
            self.form = FormMode::Closed;
        }
        if !self.actor.role.can_delete() {
            self.pending_delete = None;
        }
    }
}

/// Apply one action. Any change to the collection or a filter field
/// re-derives the visible subset before returning.
pub fn reduce(state: &mut ViewState, action: Action) {
    tracing::debug!(action = action.name(), "Dashboard action");

    match action {
        Action::SignedIn(user_id) => {
            if user_id.is_none() {
                state.actor.role = Role::Public;
            }
            state.actor.user_id = user_id;
            state.enforce_permissions();
        }
        Action::RoleResolved { user_id, role } => {
            if state.actor.user_id.as_deref() != Some(user_id.as_str()) {
                tracing::debug!(%user_id, "Ignoring role for a user no longer signed in");
                return;
            }
            state.actor.role = role;
            state.enforce_permissions();
        }
        Action::RefreshStarted => state.loading = true,
        Action::RefreshLoaded(resources) => {
            state.resources = resources;
            state.loading = false;
            state.refilter();
        }
        Action::RefreshFailed | Action::RefreshCancelled => state.loading = false,
        Action::SetQuery(query) => {
            state.filter.query = query;
            state.refilter();
        }
        Action::SetTypeFilter(choice) => {
            state.filter.resource_type = choice;
            state.refilter();
        }
        Action::SetStatusFilter(choice) => {
            state.filter.status = choice;
            state.refilter();
        }
        Action::Select(id) => state.selected_id = Some(id),
        Action::ClearSelection => state.selected_id = None,
        Action::ShowTab(tab) => state.tab = tab,
        Action::OpenCreate => {
            if state.can_create() {
                state.form = FormMode::Creating;
            }
        }
        Action::OpenEdit(resource) => {
            if state.actor.role.can_edit() {
                state.form = FormMode::Editing(resource);
            }
        }
        Action::CloseForm => state.form = FormMode::Closed,
        Action::RequestDelete(resource) => {
            if state.actor.role.can_delete() {
                state.pending_delete = Some(resource);
            }
        }
        Action::CancelDelete => state.pending_delete = None,
    }
}

const REFRESH_FAILED: &str = "Failed to fetch resources";

/// Runs store, role and notification side effects for the dashboard,
/// reporting every state change as an [`Action`] through `dispatch`.
pub struct ViewCoordinator<S, R, N> {
    store: S,
    roles: R,
    notifier: N,
}

impl<S, R, N> ViewCoordinator<S, R, N>
where
    S: ResourceStore,
    R: RoleSource,
    N: Notifier,
{
    pub fn new(store: S, roles: R, notifier: N) -> Self {
        ViewCoordinator {
            store,
            roles,
            notifier,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Initial load: who is signed in, their role, then the collection.
    pub async fn mount<D>(
        &self,
        user_id: Option<String>,
        dispatch: &mut D,
        cancel: &CancellationToken,
    ) where
        D: FnMut(Action),
    {
        dispatch(Action::SignedIn(user_id.clone()));
        if let Some(user_id) = user_id {
            let role = self.resolve_role(Some(user_id.as_str())).await;
            dispatch(Action::RoleResolved { user_id, role });
        }
        let _ = self.refresh(dispatch, cancel).await;
    }

    /// Role of `user_id`, falling back to [`Role::Public`] on any failure.
    pub async fn resolve_role(&self, user_id: Option<&str>) -> Role {
        let Some(user_id) = user_id else {
            return Role::Public;
        };
        match self.roles.role_of(user_id).await {
            Ok(role) => role,
            Err(e) => {
                tracing::warn!(%user_id, error = %e, "Role lookup failed, using public role");
                Role::Public
            }
        }
    }

    /// Reload the collection. On failure the previous collection stays.
    pub async fn refresh<D>(
        &self,
        dispatch: &mut D,
        cancel: &CancellationToken,
    ) -> Result<usize, StoreError>
    where
        D: FnMut(Action),
    {
        dispatch(Action::RefreshStarted);
        match cancel.run_until_cancelled(self.store.list()).await {
            None => {
                dispatch(Action::RefreshCancelled);
                Err(StoreError::Cancelled)
            }
            Some(Ok(resources)) => {
                let count = resources.len();
                tracing::debug!(count, "Loaded resources");
                dispatch(Action::RefreshLoaded(resources));
                Ok(count)
            }
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Resource refresh failed");
                self.notifier.notify(NoticeKind::Error, REFRESH_FAILED);
                dispatch(Action::RefreshFailed);
                Err(e)
            }
        }
    }

    async fn write(
        &self,
        form: FormMode,
        actor: &Actor,
        fields: ResourceFields,
        cancel: &CancellationToken,
    ) -> Result<(Resource, &'static str), StoreError> {
        let fields = fields.validate()?;
        match form {
            FormMode::Closed => Err(StoreError::Rejected("No resource form is open".into())),
            FormMode::Creating => {
                let Some(user_id) = actor.user_id.as_deref() else {
                    return Err(StoreError::Forbidden("create resources"));
                };
                let created = cancel
                    .run_until_cancelled(self.store.create(fields, Some(user_id)))
                    .await
                    .ok_or(StoreError::Cancelled)??;
                Ok((created, "Resource created successfully"))
            }
            FormMode::Editing(existing) => {
                if !actor.role.can_edit() {
                    return Err(StoreError::Forbidden("edit resources"));
                }
                let updated = cancel
                    .run_until_cancelled(self.store.update(&existing.id, fields))
                    .await
                    .ok_or(StoreError::Cancelled)??;
                Ok((updated, "Resource updated successfully"))
            }
        }
    }

    /// Submit the open form.
    ///
    /// On success the form closes and the collection refreshes. On failure
    /// the error is shown and returned so the form can stay open.
    pub async fn save<D>(
        &self,
        form: FormMode,
        actor: Actor,
        fields: ResourceFields,
        dispatch: &mut D,
        cancel: &CancellationToken,
    ) -> Result<Resource, StoreError>
    where
        D: FnMut(Action),
    {
        match self.write(form, &actor, fields, cancel).await {
            Ok((resource, message)) => {
                tracing::info!(id = %resource.id, "{}", message);
                self.notifier.notify(NoticeKind::Success, message);
                dispatch(Action::CloseForm);
                let _ = self.refresh(dispatch, cancel).await;
                Ok(resource)
            }
            Err(StoreError::Cancelled) => Err(StoreError::Cancelled),
            Err(e) => {
                tracing::warn!(error = %e, "Saving resource failed");
                self.notifier.notify(NoticeKind::Error, &e.to_string());
                Err(e)
            }
        }
    }

    /// Delete the resource awaiting confirmation, if any.
    ///
    /// Success and failure both clear the pending delete.
    pub async fn confirm_delete<D>(
        &self,
        pending: Option<Resource>,
        actor: Actor,
        dispatch: &mut D,
        cancel: &CancellationToken,
    ) -> Result<(), StoreError>
    where
        D: FnMut(Action),
    {
        let Some(resource) = pending else {
            return Ok(());
        };

        let result = if actor.role.can_delete() {
            cancel
                .run_until_cancelled(self.store.delete(&resource.id))
                .await
                .unwrap_or(Err(StoreError::Cancelled))
        } else {
            Err(StoreError::Forbidden("delete resources"))
        };

        match result {
            Ok(()) => {
                tracing::info!(id = %resource.id, "Resource deleted");
                self.notifier
                    .notify(NoticeKind::Success, "Resource deleted successfully");
                dispatch(Action::CancelDelete);
                let _ = self.refresh(dispatch, cancel).await;
                Ok(())
            }
            Err(StoreError::Cancelled) => Err(StoreError::Cancelled),
            Err(e) => {
                tracing::warn!(id = %resource.id, error = %e, "Deleting resource failed");
                self.notifier.notify(NoticeKind::Error, &e.to_string());
                dispatch(Action::CancelDelete);
                Err(e)
            }
        }
    }
}

/// A coordinator together with the state it drives, for headless use.
pub struct Session<S, R, N> {
    coordinator: ViewCoordinator<S, R, N>,
    state: ViewState,
    cancel: CancellationToken,
}

impl<S, R, N> Session<S, R, N>
where
    S: ResourceStore,
    R: RoleSource,
    N: Notifier,
{
    pub fn new(coordinator: ViewCoordinator<S, R, N>) -> Self {
        Session {
            coordinator,
            state: ViewState::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn coordinator(&self) -> &ViewCoordinator<S, R, N> {
        &self.coordinator
    }

    /// Token shared by every operation this session starts.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn dispatch(&mut self, action: Action) {
        reduce(&mut self.state, action);
    }

    pub async fn mount(&mut self, user_id: Option<String>) {
        let state = &mut self.state;
        self.coordinator
            .mount(user_id, &mut |a: Action| reduce(state, a), &self.cancel)
            .await;
    }

    pub async fn refresh(&mut self) -> Result<usize, StoreError> {
        let state = &mut self.state;
        self.coordinator
            .refresh(&mut |a: Action| reduce(state, a), &self.cancel)
            .await
    }

    pub async fn save(&mut self, fields: ResourceFields) -> Result<Resource, StoreError> {
        let form = self.state.form().clone();
        let actor = self.state.actor().clone();
        let state = &mut self.state;
        self.coordinator
            .save(form, actor, fields, &mut |a: Action| reduce(state, a), &self.cancel)
            .await
    }

    pub async fn confirm_delete(&mut self) -> Result<(), StoreError> {
        let pending = self.state.pending_delete().cloned();
        let actor = self.state.actor().clone();
        let state = &mut self.state;
        self.coordinator
            .confirm_delete(pending, actor, &mut |a: Action| reduce(state, a), &self.cancel)
            .await
    }
}
