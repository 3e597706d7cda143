use std::rc::Rc;

use dioxus::prelude::*;
use relief_shared::view::{reduce, Action, FormMode, Tab, ViewCoordinator, ViewState};
use relief_shared::{ResourceDraft, ResourceFields};
use tokio_util::sync::CancellationToken;

use crate::api::GraphqlStore;
use crate::components::resource_card::ResourceCard;
use crate::components::resource_form::ResourceForm;
use crate::components::resource_map::ResourceMap;
use crate::components::search_filters::SearchFilters;
use crate::components::toasts::ToastList;
use crate::identity;
use crate::notify::{Toast, ToastNotifier};

/// Key for the create-form instance (rsx keys must be formatted strings).
const CREATE_FORM_KEY: &str = "create";

type Coordinator = ViewCoordinator<GraphqlStore, GraphqlStore, ToastNotifier>;

fn dispatcher(mut state: Signal<ViewState>) -> impl FnMut(Action) {
    move |action| reduce(&mut state.write(), action)
}

#[component]
pub fn Dashboard() -> Element {
    let mut state = use_signal(ViewState::default);
    let toasts = use_signal(Vec::<Toast>::new);
    let mut saving = use_signal(|| false);
    let mut sign_in_text = use_signal(String::new);

    let cancel = use_hook(CancellationToken::new);
    let coordinator: Rc<Coordinator> = use_hook(|| {
        let store = GraphqlStore::same_origin();
        Rc::new(ViewCoordinator::new(
            store.clone(),
            store,
            ToastNotifier::new(toasts),
        ))
    });

    use_drop({
        let cancel = cancel.clone();
        move || cancel.cancel()
    });

    use_hook({
        let coordinator = coordinator.clone();
        let cancel = cancel.clone();
        move || {
            spawn(async move {
                coordinator
                    .mount(identity::current_user_id(), &mut dispatcher(state), &cancel)
                    .await;
            });
        }
    });

    let mut on_action = move |action: Action| reduce(&mut state.write(), action);

    let sign_in = {
        let coordinator = coordinator.clone();
        let cancel = cancel.clone();
        move |user_id: Option<String>| {
            identity::remember_user_id(user_id.as_deref());
            let coordinator = coordinator.clone();
            let cancel = cancel.clone();
            spawn(async move {
                coordinator
                    .mount(user_id, &mut dispatcher(state), &cancel)
                    .await;
            });
        }
    };

    let refresh = {
        let coordinator = coordinator.clone();
        let cancel = cancel.clone();
        move |_: Event<MouseData>| {
            let coordinator = coordinator.clone();
            let cancel = cancel.clone();
            spawn(async move {
                let _ = coordinator.refresh(&mut dispatcher(state), &cancel).await;
            });
        }
    };

    let submit = {
        let coordinator = coordinator.clone();
        let cancel = cancel.clone();
        move |fields: ResourceFields| {
            let coordinator = coordinator.clone();
            let cancel = cancel.clone();
            let (form, actor) = {
                let current = state.peek();
                (current.form().clone(), current.actor().clone())
            };
            spawn(async move {
                saving.set(true);
                let _ = coordinator
                    .save(form, actor, fields, &mut dispatcher(state), &cancel)
                    .await;
                saving.set(false);
            });
        }
    };

    let confirm_delete = {
        let coordinator = coordinator.clone();
        let cancel = cancel.clone();
        move |_: Event<MouseData>| {
            let coordinator = coordinator.clone();
            let cancel = cancel.clone();
            let (pending, actor) = {
                let current = state.peek();
                (current.pending_delete().cloned(), current.actor().clone())
            };
            spawn(async move {
                let _ = coordinator
                    .confirm_delete(pending, actor, &mut dispatcher(state), &cancel)
                    .await;
            });
        }
    };

    let view = state.read();
    let actor = view.actor().clone();
    let can_edit = actor.role.can_edit();
    let can_delete = actor.role.can_delete();
    let tab = view.tab();
    let visible_count = view.visible().len();
    let total_count = view.resources().len();

    rsx! {
        div { class: "app",
            header { class: "header",
                h1 { "Disaster Relief Resources" }
                div { class: "user-area",
                    if let Some(user_id) = actor.user_id.clone() {
                        span { class: "user-badge", "{user_id} ({actor.role.as_str()})" }
                        button {
                            class: "secondary",
                            onclick: {
                                let sign_in = sign_in.clone();
                                move |_| sign_in(None)
                            },
                            "Sign out"
                        }
                    } else {
                        input {
                            r#type: "text",
                            "aria-label": "User id",
                            placeholder: "User id",
                            value: "{sign_in_text}",
                            oninput: move |evt: Event<FormData>| sign_in_text.set(evt.value()),
                        }
                        button {
                            class: "secondary",
                            onclick: {
                                let sign_in = sign_in.clone();
                                move |_| {
                                    if let Some(id) = identity::normalize_user_id(&sign_in_text.peek()) {
                                        sign_in(Some(id));
                                    }
                                }
                            },
                            "Sign in"
                        }
                    }
                    button { class: "secondary", onclick: refresh, "Refresh" }
                    if view.can_create() {
                        button {
                            onclick: move |_| on_action(Action::OpenCreate),
                            "Add Resource"
                        }
                    }
                }
            }

            SearchFilters {
                filter: view.filter().clone(),
                on_action: move |action: Action| on_action(action),
            }

            nav { class: "tabs",
                button {
                    class: if tab == Tab::Grid { "tab active" } else { "tab" },
                    onclick: move |_| on_action(Action::ShowTab(Tab::Grid)),
                    "Grid View"
                }
                button {
                    class: if tab == Tab::Map { "tab active" } else { "tab" },
                    onclick: move |_| on_action(Action::ShowTab(Tab::Map)),
                    "Map View"
                }
                span { class: "result-count", "{visible_count} of {total_count} resources" }
            }

            main { class: "content",
                {match tab {
                    Tab::Grid => rsx! {
                        if view.loading() {
                            p { class: "empty-state", "Loading resources..." }
                        } else if view.visible().is_empty() {
                            p { class: "empty-state", "No resources found" }
                        } else {
                            div { class: "resource-grid",
                                for resource in view.visible().iter().cloned() {
                                    ResourceCard {
                                        key: "{resource.id}",
                                        selected: view.selected_id() == Some(resource.id.as_str()),
                                        resource: resource.clone(),
                                        can_edit,
                                        can_delete,
                                        on_action: move |action: Action| on_action(action),
                                    }
                                }
                            }
                        }
                    },
                    Tab::Map => rsx! {
                        ResourceMap {
                            state,
                            on_select: move |id: String| on_action(Action::Select(id)),
                        }
                    },
                }}
            }

            {match view.form().clone() {
                FormMode::Closed => rsx! {},
                FormMode::Creating => rsx! {
                    ResourceForm {
                        key: "{CREATE_FORM_KEY}",
                        initial: None,
                        saving: saving(),
                        on_submit: submit.clone(),
                        on_cancel: move |_: ()| on_action(Action::CloseForm),
                    }
                },
                FormMode::Editing(resource) => rsx! {
                    ResourceForm {
                        key: "{resource.id}",
                        initial: Some(ResourceDraft::from_resource(&resource)),
                        saving: saving(),
                        on_submit: submit.clone(),
                        on_cancel: move |_: ()| on_action(Action::CloseForm),
                    }
                },
            }}

            if let Some(pending) = view.pending_delete() {
                div { class: "modal-backdrop",
                    div { class: "modal confirm",
                        h2 { "Delete Resource" }
                        p { "Are you sure you want to delete \"{pending.title}\"? This cannot be undone." }
                        div { class: "form-actions",
                            button {
                                class: "secondary",
                                onclick: move |_| on_action(Action::CancelDelete),
                                "Cancel"
                            }
                            button { class: "danger", onclick: confirm_delete, "Delete" }
                        }
                    }
                }
            }

            ToastList { toasts }
        }
    }
}
