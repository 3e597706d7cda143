use dioxus::prelude::*;
use relief_shared::{ResourceDraft, ResourceFields, ResourceStatus, ResourceType};

/// One labelled text input bound to a draft field.
#[component]
fn DraftInput(
    label: &'static str,
    value: String,
    #[props(default = "text")] kind: &'static str,
    #[props(default)] required: bool,
    on_input: EventHandler<String>,
) -> Element {
    rsx! {
        label { class: "form-field",
            span { "{label}" if required { " *" } }
            input {
                r#type: kind,
                value: "{value}",
                required,
                oninput: move |evt: Event<FormData>| on_input.call(evt.value()),
            }
        }
    }
}

/// Create or edit dialog. `initial` seeds the inputs; `None` starts blank.
#[component]
pub fn ResourceForm(
    initial: Option<ResourceDraft>,
    saving: bool,
    on_submit: EventHandler<ResourceFields>,
    on_cancel: EventHandler<()>,
) -> Element {
    let editing = initial.is_some();
    let mut draft = use_signal(move || initial.unwrap_or_default());
    let mut error = use_signal(|| None::<String>);

    let submit = move |evt: Event<FormData>| {
        evt.prevent_default();
        match draft.read().clone().into_fields() {
            Ok(fields) => {
                error.set(None);
                on_submit.call(fields);
            }
            Err(e) => error.set(Some(e.to_string())),
        }
    };

    let d = draft.read().clone();
    rsx! {
        div { class: "modal-backdrop",
            div { class: "modal",
                h2 { if editing { "Edit Resource" } else { "Add Resource" } }
                form { onsubmit: submit,
                    DraftInput {
                        label: "Title",
                        value: d.title.clone(),
                        required: true,
                        on_input: move |v| draft.write().title = v,
                    }
                    div { class: "form-row",
                        label { class: "form-field",
                            span { "Type *" }
                            select {
                                value: "{d.resource_type.as_str()}",
                                onchange: move |evt: Event<FormData>| {
                                    if let Ok(t) = evt.value().parse::<ResourceType>() {
                                        draft.write().resource_type = t;
                                    }
                                },
                                for t in ResourceType::ALL {
                                    option {
                                        value: "{t.as_str()}",
                                        selected: d.resource_type == t,
                                        "{t}"
                                    }
                                }
                            }
                        }
                        label { class: "form-field",
                            span { "Status *" }
                            select {
                                value: "{d.status.as_str()}",
                                onchange: move |evt: Event<FormData>| {
                                    if let Ok(s) = evt.value().parse::<ResourceStatus>() {
                                        draft.write().status = s;
                                    }
                                },
                                for s in ResourceStatus::ALL {
                                    option {
                                        value: "{s.as_str()}",
                                        selected: d.status == s,
                                        "{s}"
                                    }
                                }
                            }
                        }
                    }
                    label { class: "form-field",
                        span { "Description" }
                        textarea {
                            value: "{d.description}",
                            oninput: move |evt: Event<FormData>| draft.write().description = evt.value(),
                        }
                    }
                    DraftInput {
                        label: "Location Name",
                        value: d.location_name.clone(),
                        required: true,
                        on_input: move |v| draft.write().location_name = v,
                    }
                    div { class: "form-row",
                        DraftInput {
                            label: "Latitude",
                            value: d.latitude.clone(),
                            required: true,
                            on_input: move |v| draft.write().latitude = v,
                        }
                        DraftInput {
                            label: "Longitude",
                            value: d.longitude.clone(),
                            required: true,
                            on_input: move |v| draft.write().longitude = v,
                        }
                    }
                    DraftInput {
                        label: "Address",
                        value: d.address.clone(),
                        on_input: move |v| draft.write().address = v,
                    }
                    div { class: "form-row",
                        DraftInput {
                            label: "Capacity",
                            value: d.capacity.clone(),
                            kind: "number",
                            on_input: move |v| draft.write().capacity = v,
                        }
                        DraftInput {
                            label: "Current Occupancy",
                            value: d.current_occupancy.clone(),
                            kind: "number",
                            on_input: move |v| draft.write().current_occupancy = v,
                        }
                    }
                    DraftInput {
                        label: "Contact Name",
                        value: d.contact_name.clone(),
                        on_input: move |v| draft.write().contact_name = v,
                    }
                    div { class: "form-row",
                        DraftInput {
                            label: "Contact Phone",
                            value: d.contact_phone.clone(),
                            kind: "tel",
                            on_input: move |v| draft.write().contact_phone = v,
                        }
                        DraftInput {
                            label: "Contact Email",
                            value: d.contact_email.clone(),
                            kind: "email",
                            on_input: move |v| draft.write().contact_email = v,
                        }
                    }
                    label { class: "form-field",
                        span { "Notes" }
                        textarea {
                            value: "{d.notes}",
                            oninput: move |evt: Event<FormData>| draft.write().notes = evt.value(),
                        }
                    }
                    if let Some(message) = &*error.read() {
                        p { class: "form-error", role: "alert", "{message}" }
                    }
                    div { class: "form-actions",
                        button {
                            r#type: "button",
                            class: "secondary",
                            onclick: move |_| on_cancel.call(()),
                            "Cancel"
                        }
                        button {
                            r#type: "submit",
                            disabled: saving,
                            if saving { "Saving..." } else if editing { "Update Resource" } else { "Create Resource" }
                        }
                    }
                }
            }
        }
    }
}
