use std::cell::RefCell;
use std::rc::Rc;

use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;
use relief_shared::markers::{MarkerReconciler, ReconcileMode};
use relief_shared::selection::{PopupLookup, SelectionSynchronizer};
use relief_shared::view::ViewState;

use crate::leaflet::{leaflet_loaded, LeafletSurface, MarkerHandle};

const MAP_ELEMENT_ID: &str = "resource-map";

/// How often, and how many times, to check whether the Leaflet script is in.
const LEAFLET_POLL_MS: u32 = 100;
const LEAFLET_POLL_ATTEMPTS: u32 = 100;

struct MapEngine {
    surface: LeafletSurface,
    markers: MarkerReconciler<MarkerHandle>,
    selection: SelectionSynchronizer,
}

type EngineSlot = Rc<RefCell<Option<MapEngine>>>;

async fn wait_for_leaflet() -> bool {
    for _ in 0..LEAFLET_POLL_ATTEMPTS {
        if leaflet_loaded() {
            return true;
        }
        TimeoutFuture::new(LEAFLET_POLL_MS).await;
    }
    leaflet_loaded()
}

fn sync_selection(engine: &mut MapEngine, state: &ViewState) {
    let MapEngine {
        surface,
        markers,
        selection,
    } = engine;
    selection.sync(state.selected_id(), state.visible(), markers, surface);
}

/// Leaflet map with one marker per visible resource.
#[component]
pub fn ResourceMap(state: Signal<ViewState>, on_select: EventHandler<String>) -> Element {
    let engine: EngineSlot = use_hook(|| Rc::new(RefCell::new(None)));
    let mut ready = use_signal(|| false);
    let mut failed = use_signal(|| false);

    let visible = use_memo(move || state.read().visible().to_vec());
    let selected = use_memo(move || state.read().selected_id().map(str::to_string));

    // Markers follow the visible subset. A fresh marker set may change which
    // popup the selection should open, so re-sync afterwards.
    use_effect({
        let engine = engine.clone();
        move || {
            let visible = visible.read();
            if !ready() {
                return;
            }
            if let Some(engine) = engine.borrow_mut().as_mut() {
                engine.markers.reconcile(&mut engine.surface, &visible);
                sync_selection(engine, &state.peek());
            }
        }
    });

    use_effect({
        let engine = engine.clone();
        move || {
            let _ = selected.read();
            if !*ready.peek() {
                return;
            }
            if let Some(engine) = engine.borrow_mut().as_mut() {
                sync_selection(engine, &state.peek());
            }
        }
    });

    use_drop({
        let engine = engine.clone();
        move || {
            if let Some(mut engine) = engine.borrow_mut().take() {
                let removed = engine.markers.dispose(&mut engine.surface);
                engine.surface.destroy();
                tracing::debug!(removed, "Map unmounted");
            }
        }
    });

    let mount = move |_: Event<MountedData>| {
        let engine = engine.clone();
        spawn(async move {
            if !wait_for_leaflet().await {
                tracing::error!("Leaflet did not load");
                failed.set(true);
                return;
            }
            match LeafletSurface::mount(MAP_ELEMENT_ID) {
                Ok(surface) => {
                    let on_click = Rc::new(move |id: &str| on_select.call(id.to_string()));
                    *engine.borrow_mut() = Some(MapEngine {
                        surface,
                        markers: MarkerReconciler::new(ReconcileMode::Keyed)
                            .with_click_handler(on_click),
                        selection: SelectionSynchronizer::new(PopupLookup::ById),
                    });
                    ready.set(true);
                }
                Err(e) => {
                    tracing::error!(error = ?e, "Failed to create map");
                    failed.set(true);
                }
            }
        });
    };

    rsx! {
        div { class: "map-wrapper",
            div { id: MAP_ELEMENT_ID, class: "resource-map", onmounted: mount }
            if failed() {
                div { class: "map-error", "The map could not be loaded." }
            } else if !ready() {
                div { class: "map-loading", "Loading map..." }
            }
        }
    }
}
