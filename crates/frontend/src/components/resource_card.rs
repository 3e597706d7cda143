use dioxus::prelude::*;
use relief_shared::view::{Action, Tab};
use relief_shared::Resource;

/// "120 / 200 (60%)", or `None` when the resource has no capacity.
pub fn occupancy_text(resource: &Resource) -> Option<String> {
    let capacity = resource.capacity.filter(|c| *c > 0)?;
    Some(format!(
        "{} / {} ({}%)",
        resource.current_occupancy.unwrap_or(0),
        capacity,
        resource.occupancy_percentage()
    ))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Bar width for the occupancy meter, clamped to the card.
fn meter_width(resource: &Resource) -> u32 {
    resource.occupancy_percentage().min(100)
}

#[component]
pub fn ResourceCard(
    resource: Resource,
    selected: bool,
    can_edit: bool,
    can_delete: bool,
    on_action: EventHandler<Action>,
) -> Element {
    let occupancy = occupancy_text(&resource);
    let width = meter_width(&resource);
    let has_position = resource.position().is_some();
    let status = resource.status.as_str();
    let kind = resource.resource_type.as_str();

    rsx! {
        div {
            class: if selected { "resource-card selected" } else { "resource-card" },
            div { class: "card-header",
                h3 { "{resource.title}" }
                span { class: "type-badge type-{kind}", "{resource.resource_type}" }
                span { class: "status-badge status-{status}", "{resource.status}" }
            }
            p { class: "card-location", "{resource.location_name}" }
            if let Some(address) = non_empty(&resource.address) {
                p { class: "card-address", "{address}" }
            }
            if let Some(description) = non_empty(&resource.description) {
                p { class: "card-description", "{description}" }
            }
            if let Some(text) = occupancy {
                div { class: "occupancy",
                    span { "Occupancy: {text}" }
                    div { class: "occupancy-meter",
                        div { class: "occupancy-fill", style: "width: {width}%;" }
                    }
                }
            }
            if let Some(name) = non_empty(&resource.contact_name) {
                p { class: "card-contact", "Contact: {name}" }
            }
            if let Some(phone) = non_empty(&resource.contact_phone) {
                p { class: "card-phone", "Phone: {phone}" }
            }
            if let Some(email) = non_empty(&resource.contact_email) {
                p { class: "card-email", "Email: {email}" }
            }
            if let Some(notes) = non_empty(&resource.notes) {
                p { class: "card-notes", "Note: {notes}" }
            }
            div { class: "card-actions",
                button {
                    class: "secondary",
                    disabled: !has_position,
                    title: if has_position { "Show on the map" } else { "No valid coordinates" },
                    onclick: {
                        let id = resource.id.clone();
                        move |_| {
                            on_action.call(Action::Select(id.clone()));
                            on_action.call(Action::ShowTab(Tab::Map));
                        }
                    },
                    "View on Map"
                }
                if can_edit {
                    button {
                        class: "secondary",
                        onclick: {
                            let resource = resource.clone();
                            move |_| on_action.call(Action::OpenEdit(resource.clone()))
                        },
                        "Edit"
                    }
                }
                if can_delete {
                    button {
                        class: "danger",
                        onclick: {
                            let resource = resource.clone();
                            move |_| on_action.call(Action::RequestDelete(resource.clone()))
                        },
                        "Delete"
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relief_shared::testing::resource;

    #[test]
    fn test_occupancy_text_with_capacity() {
        let mut r = resource("a", "1", "2");
        r.capacity = Some(200);
        r.current_occupancy = Some(120);
        assert_eq!(occupancy_text(&r).as_deref(), Some("120 / 200 (60%)"));
    }

    #[test]
    fn test_occupancy_text_without_capacity() {
        let mut r = resource("a", "1", "2");
        r.capacity = None;
        assert_eq!(occupancy_text(&r), None);
        r.capacity = Some(0);
        assert_eq!(occupancy_text(&r), None);
    }

    #[test]
    fn test_meter_clamps_over_capacity() {
        let mut r = resource("a", "1", "2");
        r.capacity = Some(10);
        r.current_occupancy = Some(15);
        assert_eq!(occupancy_text(&r).as_deref(), Some("15 / 10 (150%)"));
        assert_eq!(meter_width(&r), 100);
    }
}
