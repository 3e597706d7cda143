use crate::geo::{LatLng, FOCUS_ZOOM};
use crate::markers::{MapSurface, MarkerReconciler};
use crate::models::Resource;

/// How the popup to open is found once the viewport is centered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PopupLookup {
    /// Through the marker entry's resource id.
    #[default]
    ById,
    /// First marker whose position equals the resource's exactly. Two
    /// resources at the same spot make this ambiguous.
    ByCoordinate,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionOutcome {
    Unset,
    NotVisible,
    InvalidCoordinates,
    Focused { center: LatLng, popup_opened: bool },
}

/// Points the map at the selected resource.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectionSynchronizer {
    lookup: PopupLookup,
}

impl SelectionSynchronizer {
    pub fn new(lookup: PopupLookup) -> Self {
        SelectionSynchronizer { lookup }
    }

    /// Center on the selected resource and open its popup.
    ///
    /// Does nothing to the surface unless the selection is visible and has
    /// valid coordinates.
    pub fn sync<S: MapSurface>(
        &self,
        selected_id: Option<&str>,
        visible: &[Resource],
        markers: &MarkerReconciler<S::Marker>,
        surface: &mut S,
    ) -> SelectionOutcome {
        let Some(id) = selected_id else {
            return SelectionOutcome::Unset;
        };
        let Some(resource) = visible.iter().find(|r| r.id == id) else {
            return SelectionOutcome::NotVisible;
        };
        let Some(center) = resource.position() else {
            return SelectionOutcome::InvalidCoordinates;
        };

        surface.set_viewport(center, FOCUS_ZOOM, true);

        let marker = match self.lookup {
            PopupLookup::ById => markers.marker_for(id),
            PopupLookup::ByCoordinate => markers.marker_at(center),
        };
        let popup_opened = match marker {
            Some(marker) => {
                surface.open_popup(marker);
                true
            }
            None => false,
        };

        tracing::debug!(%id, popup_opened, "Focused selected resource");
        SelectionOutcome::Focused {
            center,
            popup_opened,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::ReconcileMode;
    use crate::testing::{resource, MapCall, RecordingMap};

    fn setup(visible: &[Resource]) -> (RecordingMap, MarkerReconciler<u32>) {
        let mut map = RecordingMap::default();
        let mut reconciler = MarkerReconciler::new(ReconcileMode::Rebuild);
        reconciler.reconcile(&mut map, visible);
        map.clear_calls();
        (map, reconciler)
    }

    #[test]
    fn test_unset_selection_is_noop() {
        let visible = vec![resource("a", "1", "1")];
        let (mut map, markers) = setup(&visible);
        let outcome = SelectionSynchronizer::default().sync(None, &visible, &markers, &mut map);
        assert_eq!(outcome, SelectionOutcome::Unset);
        assert!(map.calls().is_empty());
    }

    #[test]
    fn test_selection_outside_visible_is_noop() {
        let visible = vec![resource("a", "1", "1")];
        let (mut map, markers) = setup(&visible);
        let outcome =
            SelectionSynchronizer::default().sync(Some("zzz"), &visible, &markers, &mut map);
        assert_eq!(outcome, SelectionOutcome::NotVisible);
        assert!(map.calls().is_empty());
        assert!(map.opened_popups().is_empty());
    }

    #[test]
    fn test_selection_with_bad_coordinates_is_noop() {
        let visible = vec![resource("a", "n/a", "1")];
        let (mut map, markers) = setup(&visible);
        let outcome = SelectionSynchronizer::default().sync(Some("a"), &visible, &markers, &mut map);
        assert_eq!(outcome, SelectionOutcome::InvalidCoordinates);
        assert!(map.calls().is_empty());
    }

    #[test]
    fn test_selection_centers_and_opens_popup() {
        let visible = vec![resource("a", "1", "1"), resource("b", "44.9", "-93.2")];
        let (mut map, markers) = setup(&visible);
        let outcome = SelectionSynchronizer::default().sync(Some("b"), &visible, &markers, &mut map);

        let center = LatLng::new(44.9, -93.2);
        assert_eq!(
            outcome,
            SelectionOutcome::Focused {
                center,
                popup_opened: true
            }
        );
        assert_eq!(
            map.calls()[0],
            MapCall::SetViewport {
                center,
                zoom: FOCUS_ZOOM,
                animate: true
            }
        );
        assert_eq!(map.opened_popups(), vec![*markers.marker_for("b").unwrap()]);
    }

    #[test]
    fn test_shared_coordinates_center_correctly_by_either_lookup() {
        let visible = vec![resource("a", "1", "1"), resource("b", "1", "1")];

        for lookup in [PopupLookup::ById, PopupLookup::ByCoordinate] {
            let (mut map, markers) = setup(&visible);
            let outcome = SelectionSynchronizer::new(lookup).sync(Some("b"), &visible, &markers, &mut map);
            assert!(matches!(
                outcome,
                SelectionOutcome::Focused { center, .. } if center == LatLng::new(1.0, 1.0)
            ));
        }
    }

    #[test]
    fn test_id_lookup_opens_the_selected_marker_among_coincident_ones() {
        let visible = vec![resource("a", "1", "1"), resource("b", "1", "1")];

        let (mut map, markers) = setup(&visible);
        SelectionSynchronizer::new(PopupLookup::ById).sync(Some("b"), &visible, &markers, &mut map);
        assert_eq!(map.opened_popups(), vec![*markers.marker_for("b").unwrap()]);

        // coordinate matching lands on whichever coincident marker comes first
        let (mut map, markers) = setup(&visible);
        SelectionSynchronizer::new(PopupLookup::ByCoordinate).sync(
            Some("b"),
            &visible,
            &markers,
            &mut map,
        );
        assert_eq!(map.opened_popups(), vec![*markers.marker_for("a").unwrap()]);
    }

    #[test]
    fn test_visible_resource_without_marker_focuses_without_popup() {
        let visible = vec![resource("a", "1", "1")];
        let (mut map, _) = setup(&[]);
        let empty = MarkerReconciler::<u32>::default();
        let outcome = SelectionSynchronizer::default().sync(Some("a"), &visible, &empty, &mut map);
        assert_eq!(
            outcome,
            SelectionOutcome::Focused {
                center: LatLng::new(1.0, 1.0),
                popup_opened: false
            }
        );
    }
}
