use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::geo::{Bounds, LatLng, FIT_MAX_ZOOM, FIT_PADDING_PX};
use crate::models::{Resource, ResourceStatus, ResourceType};

/// Called with the resource id of a clicked marker.
pub type MarkerClick = Rc<dyn Fn(&str)>;

/// The map rendering collaborator.
pub trait MapSurface {
    /// Opaque handle to one live marker.
    type Marker: Clone;

    fn set_viewport(&mut self, center: LatLng, zoom: f64, animate: bool);
    fn fit_bounds(&mut self, bounds: Bounds, padding: f64, max_zoom: f64);
    fn add_marker(&mut self, at: LatLng, label: &MarkerLabel) -> Self::Marker;
    fn remove_marker(&mut self, marker: &Self::Marker);
    fn on_marker_click(&mut self, marker: &Self::Marker, callback: Box<dyn Fn()>);
    fn open_popup(&mut self, marker: &Self::Marker);
}

/// What a marker's popup shows.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerLabel {
    pub title: String,
    pub resource_type: ResourceType,
    pub location_name: String,
    pub status: ResourceStatus,
}

impl MarkerLabel {
    pub fn of(resource: &Resource) -> Self {
        MarkerLabel {
            title: resource.title.clone(),
            resource_type: resource.resource_type,
            location_name: resource.location_name.clone(),
            status: resource.status,
        }
    }

    /// Popup markup. Every interpolated value is escaped.
    pub fn popup_html(&self) -> String {
        format!(
            r#"<div class="marker-popup"><h3>{}</h3><p class="marker-type">{}</p><p class="marker-location">{}</p><span class="status-badge status-{}">{}</span></div>"#,
            escape_html(&self.title),
            self.resource_type,
            escape_html(&self.location_name),
            self.status.as_str(),
            self.status.as_str().to_uppercase(),
        )
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone)]
pub struct MarkerEntry<M> {
    pub resource_id: String,
    pub marker: M,
    pub position: LatLng,
    pub label: MarkerLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcileMode {
    /// Dispose every marker and recreate from scratch on each pass.
    #[default]
    Rebuild,
    /// Keep markers whose id, position and label are unchanged.
    Keyed,
}

/// What one reconciliation pass did.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReconcileReport {
    pub created: usize,
    pub removed: usize,
    pub kept: usize,
    /// Visible resources that got no marker (bad coordinates or repeated id).
    pub skipped: usize,
    /// Bounds the viewport was fitted to, if any marker exists.
    pub fitted: Option<Bounds>,
}

/// Keeps the map's markers in step with the visible resources.
///
/// After every [`MarkerReconciler::reconcile`] pass there is exactly one live
/// marker per visible resource id whose coordinates parse, and no others.
pub struct MarkerReconciler<M> {
    entries: Vec<MarkerEntry<M>>,
    mode: ReconcileMode,
    on_click: Option<MarkerClick>,
}

impl<M: Clone> Default for MarkerReconciler<M> {
    fn default() -> Self {
        Self::new(ReconcileMode::default())
    }
}

impl<M: Clone> MarkerReconciler<M> {
    pub fn new(mode: ReconcileMode) -> Self {
        MarkerReconciler {
            entries: Vec::new(),
            mode,
            on_click: None,
        }
    }

    /// Report marker clicks to `callback`. Applies to markers created after
    /// this call.
    pub fn with_click_handler(mut self, callback: MarkerClick) -> Self {
        self.on_click = Some(callback);
        self
    }

    pub fn mode(&self) -> ReconcileMode {
        self.mode
    }

    pub fn entries(&self) -> &[MarkerEntry<M>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn marker_for(&self, resource_id: &str) -> Option<&M> {
        self.entries
            .iter()
            .find(|e| e.resource_id == resource_id)
            .map(|e| &e.marker)
    }

    /// First marker sitting exactly at `position`.
    pub fn marker_at(&self, position: LatLng) -> Option<&M> {
        self.entries
            .iter()
            .find(|e| e.position.lat == position.lat && e.position.lng == position.lng)
            .map(|e| &e.marker)
    }

    /// Make the marker set match `visible` and fit the viewport to it.
    ///
    /// Resources with unparseable coordinates are skipped silently. With no
    /// valid coordinates at all the viewport is left where it is.
    pub fn reconcile<S>(&mut self, surface: &mut S, visible: &[Resource]) -> ReconcileReport
    where
        S: MapSurface<Marker = M>,
    {
        let mut report = ReconcileReport::default();
        let mut previous: HashMap<String, MarkerEntry<M>> = HashMap::new();

        match self.mode {
            ReconcileMode::Rebuild => {
                for entry in self.entries.drain(..) {
                    surface.remove_marker(&entry.marker);
                    report.removed += 1;
                }
            }
            ReconcileMode::Keyed => {
                previous = self
                    .entries
                    .drain(..)
                    .map(|e| (e.resource_id.clone(), e))
                    .collect();
            }
        }

        let mut seen: HashSet<&str> = HashSet::new();
        let mut points = Vec::with_capacity(visible.len());

        for resource in visible {
            let Some(position) = resource.position() else {
                report.skipped += 1;
                continue;
            };
            if !seen.insert(resource.id.as_str()) {
                tracing::warn!(id = %resource.id, "Duplicate resource id in visible set");
                report.skipped += 1;
                continue;
            }
            points.push(position);

            let label = MarkerLabel::of(resource);
            if let Some(old) = previous.remove(&resource.id) {
                if old.position == position && old.label == label {
                    self.entries.push(old);
                    report.kept += 1;
                    continue;
                }
                surface.remove_marker(&old.marker);
                report.removed += 1;
            }

            let marker = surface.add_marker(position, &label);
            if let Some(on_click) = &self.on_click {
                let on_click = on_click.clone();
                let id = resource.id.clone();
                surface.on_marker_click(&marker, Box::new(move || on_click(&id)));
            }
            self.entries.push(MarkerEntry {
                resource_id: resource.id.clone(),
                marker,
                position,
                label,
            });
            report.created += 1;
        }

        for (_, stale) in previous.drain() {
            surface.remove_marker(&stale.marker);
            report.removed += 1;
        }

        if let Some(bounds) = Bounds::from_points(points) {
            surface.fit_bounds(bounds, FIT_PADDING_PX, FIT_MAX_ZOOM);
            report.fitted = Some(bounds);
        }

        tracing::debug!(
            created = report.created,
            removed = report.removed,
            kept = report.kept,
            skipped = report.skipped,
            live = self.entries.len(),
            "Reconciled map markers"
        );

        report
    }

    /// Remove every marker, e.g. when the map unmounts.
    pub fn dispose<S>(&mut self, surface: &mut S) -> usize
    where
        S: MapSurface<Marker = M>,
    {
        let count = self.entries.len();
        for entry in self.entries.drain(..) {
            surface.remove_marker(&entry.marker);
        }
        count
    }
}
