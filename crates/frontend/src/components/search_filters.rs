use dioxus::prelude::*;
use relief_shared::filter::{Choice, FilterState};
use relief_shared::view::Action;
use relief_shared::{ResourceStatus, ResourceType};

#[component]
pub fn SearchFilters(filter: FilterState, on_action: EventHandler<Action>) -> Element {
    rsx! {
        div { class: "filters",
            input {
                r#type: "search",
                class: "filter-query",
                "aria-label": "Search resources",
                placeholder: "Search by title, location or description...",
                value: "{filter.query}",
                oninput: move |evt: Event<FormData>| {
                    on_action.call(Action::SetQuery(evt.value()));
                },
            }
            select {
                "aria-label": "Filter by type",
                value: "{filter.resource_type.as_str()}",
                onchange: move |evt: Event<FormData>| {
                    match Choice::<ResourceType>::parse(&evt.value()) {
                        Ok(choice) => on_action.call(Action::SetTypeFilter(choice)),
                        Err(e) => tracing::warn!(error = %e, "Ignoring type filter value"),
                    }
                },
                option { value: "all", selected: filter.resource_type == Choice::All, "All Types" }
                for t in ResourceType::ALL {
                    option {
                        value: "{t.as_str()}",
                        selected: filter.resource_type == Choice::Only(t),
                        "{t}"
                    }
                }
            }
            select {
                "aria-label": "Filter by status",
                value: "{filter.status.as_str()}",
                onchange: move |evt: Event<FormData>| {
                    match Choice::<ResourceStatus>::parse(&evt.value()) {
                        Ok(choice) => on_action.call(Action::SetStatusFilter(choice)),
                        Err(e) => tracing::warn!(error = %e, "Ignoring status filter value"),
                    }
                },
                option { value: "all", selected: filter.status == Choice::All, "All Statuses" }
                for s in ResourceStatus::ALL {
                    option {
                        value: "{s.as_str()}",
                        selected: filter.status == Choice::Only(s),
                        "{s}"
                    }
                }
            }
        }
    }
}
