//! Tests d'intégration du contrôleur de viewport sur une surface en mémoire

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use coolector_map::marker::style::{MarkerColor, MarkerSize};
use coolector_map::surface::SurfaceOp;
use coolector_map::{
    ChannelEvent, Collaborators, EventChannel, FilterState, FilterStore, GeoPoint, LocalChannel,
    LocationProvider, LocationUpdate, MemorySurfaceFactory, MemorySurfaceHandle, RadiusChange,
    RecordingLogger, Remark, RemarkCategory, RouteGenerator, Topic, Translator, ViewportController,
    ViewportSettings,
};

const DEVICE: GeoPoint = GeoPoint::new(52.2297, 21.0122);
const STORED: GeoPoint = GeoPoint::new(50.0647, 19.945);

#[derive(Default)]
struct MemoryStore {
    state: RefCell<FilterState>,
    mutations: Cell<usize>,
}

impl MemoryStore {
    fn with_center(center: GeoPoint) -> Self {
        let store = Self::default();
        store.state.borrow_mut().center = center;
        store
    }

    fn touch(&self) {
        self.mutations.set(self.mutations.get() + 1);
    }
}

impl FilterStore for MemoryStore {
    fn filters(&self) -> FilterState {
        self.state.borrow().clone()
    }

    fn set_center(&self, center: GeoPoint) {
        self.touch();
        self.state.borrow_mut().center = center;
    }

    fn set_default_center(&self, center: GeoPoint) {
        self.touch();
        self.state.borrow_mut().center = center;
    }

    fn set_zoom_level(&self, zoom_level: u8) {
        self.touch();
        self.state.borrow_mut().zoom_level = zoom_level;
    }

    fn set_radius(&self, radius_meters: f64) {
        self.touch();
        self.state.borrow_mut().radius_meters = radius_meters;
    }
}

struct Device(Option<GeoPoint>);

impl LocationProvider for Device {
    fn current(&self) -> Option<GeoPoint> {
        self.0
    }
}

struct Keys;

impl Translator for Keys {
    fn tr(&self, key: &str) -> String {
        key.to_string()
    }
}

struct Paths;

impl RouteGenerator for Paths {
    fn generate(&self, route: &str, params: &[(&str, &str)]) -> String {
        let id = params.iter().find(|(k, _)| *k == "id").map(|(_, v)| *v);
        format!("/{}s/{}", route, id.unwrap_or(""))
    }
}

struct Fixture {
    controller: ViewportController,
    handle: MemorySurfaceHandle,
    store: Rc<MemoryStore>,
    channel: Rc<LocalChannel>,
    logger: Rc<RecordingLogger>,
}

fn fixture_with(
    store: MemoryStore,
    device: Option<GeoPoint>,
    settings: ViewportSettings,
) -> Fixture {
    let store = Rc::new(store);
    let channel = Rc::new(LocalChannel::new());
    let logger = Rc::new(RecordingLogger::new());
    let factory = MemorySurfaceFactory::new();
    let handle = factory.handle();

    let collaborators = Collaborators {
        location: Rc::new(Device(device)),
        filters: store.clone(),
        channel: channel.clone(),
        translator: Rc::new(Keys),
        router: Rc::new(Paths),
        logger: logger.clone(),
    };
    let controller = ViewportController::new(collaborators, Box::new(factory), settings);

    Fixture {
        controller,
        handle,
        store,
        channel,
        logger,
    }
}

fn fixture(center: GeoPoint, device: Option<GeoPoint>) -> Fixture {
    fixture_with(
        MemoryStore::with_center(center),
        device,
        ViewportSettings::default(),
    )
}

fn remark(id: &str, category: &str, rating: i32) -> Remark {
    Remark {
        id: id.to_string(),
        location: GeoPoint::new(52.23 + rating as f64 * 0.001, 21.01),
        category: RemarkCategory::from(category),
        description: Some("Broken bench".to_string()),
        rating,
        selected: false,
        resolved: false,
    }
}

fn publish_location(channel: &LocalChannel, position: GeoPoint) {
    channel.publish(&ChannelEvent::LocationLoaded(LocationUpdate::new(
        position.latitude,
        position.longitude,
    )));
}

#[test]
fn test_unset_center_uses_device_position() {
    let f = fixture(GeoPoint::UNSET, Some(DEVICE));
    f.controller.attach();

    assert_eq!(f.handle.center(), DEVICE);
    assert_eq!(f.controller.snapshot().unwrap().position, DEVICE);
}

#[test]
fn test_stored_center_wins_over_device() {
    let f = fixture(STORED, Some(DEVICE));
    f.controller.attach();

    assert_eq!(f.handle.center(), STORED);
    // Le marqueur utilisateur reste sur l'appareil
    let user = f.handle.markers_with_color(MarkerColor::USER);
    assert_eq!(user.len(), 1);
    assert_eq!(user[0].position, DEVICE);
}

#[test]
fn test_stored_zoom_is_floored() {
    let store = MemoryStore::default();
    store.state.borrow_mut().zoom_level = 3;
    let f = fixture_with(store, Some(DEVICE), ViewportSettings::default());
    f.controller.attach();

    assert_eq!(f.handle.zoom(), 8);
    assert_eq!(f.handle.min_zoom(), 8);
}

#[test]
fn test_attach_registers_listeners_and_announces_map() {
    let f = fixture(GeoPoint::UNSET, Some(DEVICE));
    let loaded = Rc::new(Cell::new(0));
    let counter = Rc::clone(&loaded);
    let _token = f.channel.subscribe(
        Topic::MapLoaded,
        Box::new(move |_| counter.set(counter.get() + 1)),
    );

    f.controller.attach();

    assert_eq!(loaded.get(), 1);
    assert_eq!(f.handle.listener_count(), 4);
    assert_eq!(f.channel.subscriber_count(Topic::LocationLoaded), 1);
    assert_eq!(f.channel.subscriber_count(Topic::ResetCenter), 1);
    assert!(f.logger.error_tags().is_empty());
    assert_eq!(f.logger.trace_tags(), vec!["map_draw"]);
}

#[test]
fn test_location_published_on_map_loaded_is_observed() {
    let f = fixture(GeoPoint::UNSET, Some(DEVICE));
    let channel = Rc::clone(&f.channel);
    let moved = GeoPoint::new(52.3, 21.1);
    let _token = f.channel.subscribe(
        Topic::MapLoaded,
        Box::new(move |_| publish_location(&channel, moved)),
    );

    f.controller.attach();

    let user = f.handle.markers_with_color(MarkerColor::USER);
    assert_eq!(user.len(), 1);
    assert_eq!(user[0].position, moved);
}

#[test]
fn test_user_marker_never_leaks() {
    let f = fixture(GeoPoint::UNSET, Some(DEVICE));
    f.controller.attach();

    for i in 0..10 {
        publish_location(&f.channel, GeoPoint::new(52.0 + f64::from(i) * 0.001, 21.0));
        assert_eq!(f.handle.markers_with_color(MarkerColor::USER).len(), 1);
    }

    let user = f.handle.markers_with_color(MarkerColor::USER);
    assert_eq!(user[0].position, GeoPoint::new(52.0 + 9.0 * 0.001, 21.0));
    assert_eq!(f.store.filters().center, GeoPoint::new(52.0 + 9.0 * 0.001, 21.0));
    assert_eq!(user[0].title, "common.user");
}

#[test]
fn test_no_mutation_after_detach() {
    let f = fixture(GeoPoint::UNSET, Some(DEVICE));
    f.controller.attach();
    f.controller.detach();

    let before = f.store.mutations.get();
    publish_location(&f.channel, GeoPoint::new(48.85, 2.35));
    f.channel
        .publish(&ChannelEvent::ResetCenter(GeoPoint::new(48.85, 2.35)));

    assert_eq!(f.store.mutations.get(), before);
    assert!(!f.handle.is_alive());
    assert_eq!(f.handle.listener_count(), 0);
    assert_eq!(f.channel.subscriber_count(Topic::LocationLoaded), 0);
    assert_eq!(f.channel.subscriber_count(Topic::ResetCenter), 0);
    assert!(f.logger.error_tags().is_empty());
}

#[test]
fn test_drop_releases_subscriptions() {
    let f = fixture(GeoPoint::UNSET, Some(DEVICE));
    f.controller.attach();
    let Fixture {
        controller,
        handle,
        channel,
        ..
    } = f;

    drop(controller);

    assert!(!handle.is_alive());
    assert_eq!(channel.subscriber_count(Topic::LocationLoaded), 0);
}

#[test]
fn test_location_update_snaps_marker_until_dragged() {
    let f = fixture(GeoPoint::UNSET, Some(DEVICE));
    f.controller.attach();
    let moves = f.handle.stats().marker_moves;

    publish_location(&f.channel, GeoPoint::new(52.24, 21.02));
    assert_eq!(f.handle.stats().marker_moves, moves + 1);
    assert!(!f.controller.snapshot().unwrap().map_dragged);
}

#[test]
fn test_location_update_after_drag_does_not_recenter() {
    let f = fixture(GeoPoint::UNSET, Some(DEVICE));
    f.controller.attach();

    let dragged_to = GeoPoint::new(52.4, 21.3);
    f.handle.drag_to(dragged_to);
    assert!(f.controller.snapshot().unwrap().map_dragged);
    assert_eq!(f.store.filters().center, dragged_to);

    let stats = f.handle.stats();
    let update = GeoPoint::new(52.25, 21.05);
    publish_location(&f.channel, update);

    // Marqueur redessiné, mais ni recalé ni recentré
    let user = f.handle.markers_with_color(MarkerColor::USER);
    assert_eq!(user.len(), 1);
    assert_eq!(user[0].position, update);
    assert_eq!(f.handle.stats().marker_moves, stats.marker_moves);
    assert_eq!(f.handle.stats().set_center_calls, stats.set_center_calls);
    assert_eq!(f.handle.center(), dragged_to);
}

#[test]
fn test_reset_center_clears_dragged_flag() {
    let f = fixture(GeoPoint::UNSET, Some(DEVICE));
    f.controller.attach();
    f.handle.drag_to(GeoPoint::new(52.4, 21.3));

    let home = GeoPoint::new(52.2, 21.0);
    f.channel.publish(&ChannelEvent::ResetCenter(home));

    assert_eq!(f.handle.center(), home);
    assert!(!f.controller.snapshot().unwrap().map_dragged);
    // Le listener center_changed a persisté le nouveau centre
    assert_eq!(f.store.filters().center, home);

    let moves = f.handle.stats().marker_moves;
    publish_location(&f.channel, GeoPoint::new(52.21, 21.01));
    assert_eq!(f.handle.stats().marker_moves, moves + 1);
}

#[test]
fn test_zoom_persists_level_and_radius() {
    let f = fixture(GeoPoint::UNSET, Some(DEVICE));
    f.controller.attach();

    f.handle.zoom_to(13);

    let filters = f.store.filters();
    assert_eq!(filters.zoom_level, 13);
    assert!(filters.radius_meters.is_finite());
    assert!(filters.radius_meters > 1000.0);
    assert!(f.controller.snapshot().unwrap().map_dragged);
}

#[test]
fn test_radius_persisted_before_callback() {
    let f = fixture(GeoPoint::UNSET, Some(DEVICE));
    let store = Rc::clone(&f.store);
    let seen: Rc<RefCell<Vec<(RadiusChange, f64)>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    f.controller.on_radius_changed(move |change| {
        sink.borrow_mut()
            .push((change, store.filters().radius_meters));
    });
    f.controller.attach();

    f.handle.zoom_to(14);
    f.handle.drag_to(GeoPoint::new(52.3, 21.1));

    let seen = seen.borrow();
    assert_eq!(seen.len(), 2);
    for (change, stored) in seen.iter() {
        assert_eq!(change.radius_meters, *stored);
    }
    let center = seen[1].0.center;
    assert!((center.latitude - 52.3).abs() < 1e-9);
    assert!((center.longitude - 21.1).abs() < 1e-9);
}

#[test]
fn test_radius_grows_when_zooming_out() {
    let f = fixture(GeoPoint::UNSET, Some(DEVICE));
    let radii = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&radii);
    f.controller
        .on_radius_changed(move |change| sink.borrow_mut().push(change.radius_meters));
    f.controller.attach();

    for zoom in [16, 15, 14, 13, 12, 11, 10] {
        f.handle.zoom_to(zoom);
    }

    let radii = radii.borrow();
    assert_eq!(radii.len(), 7);
    assert!(radii.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_callback_may_drive_the_controller() {
    let f = Rc::new(fixture(GeoPoint::UNSET, Some(DEVICE)));
    let inner = Rc::downgrade(&f);
    f.controller.on_radius_changed(move |_| {
        if let Some(f) = inner.upgrade() {
            f.controller.set_remarks(vec![remark("r1", "litter", 0)]);
        }
    });
    f.controller.attach();

    f.handle.zoom_to(12);

    assert!(f.controller.remark_marker("r1").is_some());
}

#[test]
fn test_center_latch_applies_once() {
    let f = fixture(GeoPoint::UNSET, Some(DEVICE));

    // Pas encore de surface : la valeur est ignorée sans consommer le verrou
    f.controller.set_center(Some(GeoPoint::new(10.0, 10.0)));
    f.controller.attach();
    assert_eq!(f.handle.center(), DEVICE);

    f.controller.set_center(None);
    assert!(!f.controller.snapshot().unwrap().center_initialized);

    let first = GeoPoint::new(51.1, 17.03);
    f.controller.set_center(Some(first));
    f.controller.set_center(Some(GeoPoint::new(54.35, 18.65)));

    assert_eq!(f.handle.center(), first);
    assert_eq!(f.handle.stats().set_center_calls, 1);
    assert!(f.controller.snapshot().unwrap().center_initialized);
    assert_eq!(f.store.filters().center, first);
}

#[test]
fn test_invalid_center_is_logged() {
    let f = fixture(GeoPoint::UNSET, Some(DEVICE));
    f.controller.attach();

    f.controller.set_center(Some(GeoPoint::new(f64::NAN, 0.0)));

    assert_eq!(f.logger.error_tags(), vec!["map_center_changed"]);
    assert!(!f.controller.snapshot().unwrap().center_initialized);
}

#[test]
fn test_surface_construction_failure_is_tolerated() {
    let f = fixture(GeoPoint::UNSET, Some(DEVICE));
    f.handle.inject_fault(SurfaceOp::Create);
    let loaded = Rc::new(Cell::new(false));
    let flag = Rc::clone(&loaded);
    let _token = f
        .channel
        .subscribe(Topic::MapLoaded, Box::new(move |_| flag.set(true)));

    f.controller.attach();
    f.controller.set_remarks(vec![remark("r1", "damages", 0)]);
    f.controller.set_center(Some(STORED));
    publish_location(&f.channel, GeoPoint::new(52.3, 21.1));
    f.controller.detach();

    assert!(loaded.get());
    assert_eq!(f.handle.listener_count(), 0);
    assert_eq!(
        f.logger.error_tags(),
        vec![
            "map_draw_map",
            "map_draw_user_marker",
            "map_draw_remark_marker",
            "map_draw_user_marker",
        ]
    );
    assert_eq!(f.channel.subscriber_count(Topic::LocationLoaded), 0);
}

#[test]
fn test_missing_device_position_is_logged() {
    let f = fixture(GeoPoint::UNSET, None);
    f.controller.attach();

    assert_eq!(f.handle.center(), GeoPoint::UNSET);
    assert_eq!(f.handle.marker_count(), 0);
    assert_eq!(f.logger.error_tags(), vec!["map_draw_user_marker"]);

    publish_location(&f.channel, DEVICE);
    assert_eq!(f.handle.markers_with_color(MarkerColor::USER).len(), 1);
}

#[test]
fn test_failures_are_tagged_and_isolated() {
    let f = fixture(GeoPoint::UNSET, Some(DEVICE));
    f.controller.attach();

    f.handle.inject_fault(SurfaceOp::Bounds);
    f.handle.zoom_to(12);
    f.handle.clear_fault(SurfaceOp::Bounds);

    f.handle.inject_fault(SurfaceOp::Center);
    f.handle.drag_to(GeoPoint::new(52.3, 21.1));
    f.handle.clear_fault(SurfaceOp::Center);

    publish_location(&f.channel, GeoPoint::new(f64::NAN, 21.0));

    f.handle.inject_fault(SurfaceOp::SetMarkerPosition);
    f.channel
        .publish(&ChannelEvent::ResetCenter(GeoPoint::new(52.2, 21.0)));
    publish_location(&f.channel, GeoPoint::new(52.21, 21.0));
    f.handle.clear_fault(SurfaceOp::SetMarkerPosition);

    assert_eq!(
        f.logger.error_tags(),
        vec![
            "map_recalculate_radius",
            "map_center_changed_listener",
            "map_location_updated",
            "map_move_marker",
        ]
    );

    // La carte reste utilisable
    f.handle.zoom_to(11);
    assert_eq!(f.store.filters().zoom_level, 11);
    assert_eq!(f.logger.error_tags().len(), 4);
}

#[test]
fn test_remarks_rendered_with_style() {
    let store = MemoryStore::default();
    store.state.borrow_mut().distinguish_liked = true;
    let f = fixture_with(store, Some(DEVICE), ViewportSettings::default());

    // Une liste reçue avant l'activation est rendue à l'activation
    let mut selected = remark("r3", "accidents", 0);
    selected.selected = true;
    selected.resolved = true;
    f.controller.set_remarks(vec![
        remark("r1", "litter", 3),
        remark("r2", "damages", 1),
        selected,
    ]);
    f.controller.attach();

    assert_eq!(f.controller.snapshot().unwrap().remark_markers, 3);
    let liked = f
        .handle
        .marker(f.controller.remark_marker("r1").unwrap())
        .unwrap();
    assert_eq!(liked.size, MarkerSize::ENLARGED);
    assert_eq!(liked.color, "9F6807");

    let damages = f
        .handle
        .marker(f.controller.remark_marker("r2").unwrap())
        .unwrap();
    assert_eq!(damages.size, MarkerSize::STANDARD);
    assert_eq!(damages.color, "E40521");
    assert_eq!(f.handle.markers_with_color(MarkerColor::SELECTED).len(), 1);
}

#[test]
fn test_remark_list_is_replaced() {
    let f = fixture(GeoPoint::UNSET, Some(DEVICE));
    f.controller.attach();

    f.controller
        .set_remarks(vec![remark("a", "litter", 0), remark("b", "litter", 1)]);
    f.controller.set_remarks(vec![remark("c", "damages", 0)]);

    // Un marqueur utilisateur plus un marqueur de remarque
    assert_eq!(f.handle.marker_count(), 2);
    assert!(f.controller.remark_marker("a").is_none());
    assert!(f.controller.remark_marker("c").is_some());
}

#[test]
fn test_marker_click_opens_its_own_popup() {
    let f = fixture(GeoPoint::UNSET, Some(DEVICE));
    f.controller.attach();
    f.controller
        .set_remarks(vec![remark("r1", "litter", 0), remark("r2", "damages", 1)]);

    let marker = f.controller.remark_marker("r2").unwrap();
    f.handle.click_marker(marker);

    let (window, anchor) = f.handle.opened_info_window().unwrap();
    assert_eq!(anchor, marker);
    let content = f.handle.info_window(window).unwrap();
    assert!(content.contains("remark.category_damages"));
    assert!(content.contains(r#"href="/remarks/r2""#));
}

#[test]
fn test_radius_circle_follows_viewport() {
    let settings = ViewportSettings {
        draw_radius: true,
        ..ViewportSettings::default()
    };
    let f = fixture_with(MemoryStore::default(), Some(DEVICE), settings);
    f.controller.attach();

    let circles = f.handle.circles();
    assert_eq!(circles.len(), 1);
    assert_eq!(circles[0].radius_meters, 1000.0);
    assert_eq!(circles[0].stroke_color, "#308AF1");

    f.handle.zoom_to(12);

    let circles = f.handle.circles();
    assert_eq!(circles.len(), 1);
    assert_eq!(circles[0].radius_meters, f.store.filters().radius_meters);
}

#[test]
fn test_snapshot_serializes() {
    let f = fixture(STORED, Some(DEVICE));
    f.controller.attach();

    let json = serde_json::to_value(f.controller.snapshot().unwrap()).unwrap();
    assert_eq!(json["attached"], true);
    assert_eq!(json["mapDragged"], false);
    assert_eq!(json["remarkMarkers"], 0);
    assert_eq!(json["position"]["latitude"], STORED.latitude);
}
