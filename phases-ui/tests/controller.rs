use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;
use phases_client::{PhaseSource, SourceError};
use phases_core::{CardKey, CardState, PhaseDetail, PhaseSummary, ReleaseYear, TimelineConfig, TimelineError};
use phases_ui::controller::{EMPTY_MESSAGE, FATAL_STATUS};
use phases_ui::{
    CardFragment, CardRenderer, FrameScheduler, LoadOutcome, MemorySurface, MessageKind,
    SurfaceError, TimelineController, TimelineSurface, UiError,
};

type Log = Rc<RefCell<Vec<String>>>;

struct ScriptedSource {
    phases: Result<Vec<PhaseSummary>, String>,
    details: HashMap<String, PhaseDetail>,
    log: Log,
}

#[async_trait(?Send)]
impl PhaseSource for ScriptedSource {
    async fn list_phases(&self) -> Result<Vec<PhaseSummary>, SourceError> {
        self.log.borrow_mut().push("list".to_string());
        tokio::task::yield_now().await;
        self.phases.clone().map_err(|message| SourceError::Status {
            status: 401,
            message,
        })
    }

    async fn phase_detail(&self, phase: &PhaseSummary) -> Result<PhaseDetail, SourceError> {
        self.log
            .borrow_mut()
            .push(format!("detail:{}", phase.phase_period));
        tokio::task::yield_now().await;
        self.details
            .get(&phase.phase_period)
            .cloned()
            .ok_or_else(|| SourceError::Status {
                status: 500,
                message: format!("no detail for {}", phase.phase_period),
            })
    }
}

/// Memory surface that also writes every change into the shared log.
struct JournalSurface {
    inner: MemorySurface,
    log: Log,
    /// Node the host page has removed; replacing it fails.
    removed: Option<CardKey>,
}

impl TimelineSurface for JournalSurface {
    fn set_status(&mut self, text: &str) -> Result<(), SurfaceError> {
        self.inner.set_status(text)
    }

    fn show_message(&mut self, kind: MessageKind, text: &str) -> Result<(), SurfaceError> {
        self.log.borrow_mut().push(format!("message:{kind:?}"));
        self.inner.show_message(kind, text)
    }

    fn mount_card(&mut self, fragment: &CardFragment) -> Result<(), SurfaceError> {
        self.log.borrow_mut().push(format!("mount:{}", fragment.key));
        self.inner.mount_card(fragment)
    }

    fn replace_card(&mut self, fragment: &CardFragment) -> Result<(), SurfaceError> {
        let visibility = if fragment.visible { "shown" } else { "hidden" };
        self.log
            .borrow_mut()
            .push(format!("replace:{}:{visibility}", fragment.key));
        if self.removed.as_ref() == Some(&fragment.key) {
            return Err(SurfaceError("node gone".to_string()));
        }
        self.inner.replace_card(fragment)
    }

    fn set_visible(&mut self, key: &CardKey, visible: bool) -> Result<(), SurfaceError> {
        self.log.borrow_mut().push(format!("visible:{key}"));
        self.inner.set_visible(key, visible)
    }
}

struct RecordingScheduler {
    log: Log,
}

#[async_trait(?Send)]
impl FrameScheduler for RecordingScheduler {
    async fn next_tick(&self) {
        self.log.borrow_mut().push("tick".to_string());
        tokio::task::yield_now().await;
    }
}

fn detail(name: &str) -> PhaseDetail {
    PhaseDetail {
        ai_phase_name: name.to_string(),
        ai_phase_summary: format!("All about {name}."),
        average_release_year: ReleaseYear::Year(2015.0),
        average_popularity: 50.0,
        sample_tracks: vec![format!("{name} track")],
        top_genres: vec!["rock".to_string()],
        phase_cover_url: "http://img/cover.jpg".to_string(),
    }
}

type TestController = TimelineController<ScriptedSource, JournalSurface, RecordingScheduler>;

fn controller(
    phases: Result<Vec<PhaseSummary>, String>,
    details: HashMap<String, PhaseDetail>,
) -> (TestController, Log) {
    controller_with_removed_node(phases, details, None)
}

fn controller_with_removed_node(
    phases: Result<Vec<PhaseSummary>, String>,
    details: HashMap<String, PhaseDetail>,
    removed: Option<CardKey>,
) -> (TestController, Log) {
    let log: Log = Rc::default();
    let source = ScriptedSource {
        phases,
        details,
        log: log.clone(),
    };
    let surface = JournalSurface {
        inner: MemorySurface::new(),
        log: log.clone(),
        removed,
    };
    let controller = TimelineController::new(TimelineConfig::default(), source, surface)
        .with_scheduler(RecordingScheduler { log: log.clone() })
        .with_renderer(CardRenderer::seeded(11));
    (controller, log)
}

fn entries(log: &Log) -> Vec<String> {
    log.borrow().clone()
}

fn position(log: &[String], entry: &str) -> usize {
    log.iter()
        .position(|e| e == entry)
        .unwrap_or_else(|| panic!("{entry} not in {log:?}"))
}

#[tokio::test]
async fn placeholders_mount_in_order_before_any_detail_request() {
    let phases = vec![
        PhaseSummary::new("Autumn 2023", 4),
        PhaseSummary::new("Summer 2023", 9),
        PhaseSummary::new("Spring 2023", 2),
    ];
    let details = phases
        .iter()
        .map(|p| (p.phase_period.clone(), detail(&p.phase_period)))
        .collect();
    let (mut controller, log) = controller(Ok(phases), details);

    let outcome = controller.load_timeline().await.unwrap();

    assert_eq!(
        outcome,
        LoadOutcome::Loaded {
            populated: 3,
            failed: 0
        }
    );
    let log = entries(&log);
    assert_eq!(
        &log[..4],
        [
            "list",
            "mount:phase-Autumn-2023",
            "mount:phase-Summer-2023",
            "mount:phase-Spring-2023"
        ]
    );
    let first_detail = log.iter().position(|e| e.starts_with("detail:")).unwrap();
    let last_mount = log.iter().rposition(|e| e.starts_with("mount:")).unwrap();
    assert!(last_mount < first_detail);

    let order: Vec<&str> = controller
        .surface()
        .inner
        .cards()
        .iter()
        .map(|card| card.key.as_str())
        .collect();
    assert_eq!(
        order,
        ["phase-Autumn-2023", "phase-Summer-2023", "phase-Spring-2023"]
    );
}

#[tokio::test]
async fn details_load_one_at_a_time_in_list_order() {
    let phases = vec![PhaseSummary::new("A 1", 1), PhaseSummary::new("B 2", 2)];
    let details = phases
        .iter()
        .map(|p| (p.phase_period.clone(), detail(&p.phase_period)))
        .collect();
    let (mut controller, log) = controller(Ok(phases), details);

    controller.load_timeline().await.unwrap();

    let log = entries(&log);
    assert_eq!(
        &log[3..],
        [
            "detail:A 1",
            "replace:phase-A-1:hidden",
            "tick",
            "visible:phase-A-1",
            "detail:B 2",
            "replace:phase-B-2:hidden",
            "tick",
            "visible:phase-B-2",
        ]
    );
    assert!(controller
        .surface()
        .inner
        .cards()
        .iter()
        .all(|card| card.visible));
}

#[tokio::test]
async fn failed_phase_list_mounts_nothing() {
    let (mut controller, log) = controller(Err("Not authenticated".to_string()), HashMap::new());

    let err = controller.load_timeline().await.unwrap_err();

    assert!(matches!(err, UiError::Timeline(TimelineError::PhaseList(_))));
    assert_eq!(entries(&log), ["list", "message:Error"]);

    let surface = &controller.surface().inner;
    assert!(surface.cards().is_empty());
    assert_eq!(surface.status(), FATAL_STATUS);
    let (kind, text) = surface.message().unwrap();
    assert_eq!(kind, MessageKind::Error);
    assert!(text.starts_with("Could not load your timeline"));
    assert!(text.contains("Not authenticated"));
    assert!(controller.cards().is_empty());
}

#[tokio::test]
async fn empty_phase_list_shows_nothing_to_show() {
    let (mut controller, log) = controller(Ok(Vec::new()), HashMap::new());

    let outcome = controller.load_timeline().await.unwrap();

    assert_eq!(outcome, LoadOutcome::Empty);
    assert_eq!(entries(&log), ["list", "message:Empty"]);
    let surface = &controller.surface().inner;
    assert_eq!(surface.message(), Some((MessageKind::Empty, EMPTY_MESSAGE)));
    assert!(surface.cards().is_empty());
}

#[tokio::test]
async fn failed_detail_is_isolated_to_its_card() {
    let phases = vec![
        PhaseSummary::new("Winter 2022", 5),
        PhaseSummary::new("Autumn 2022", 6),
        PhaseSummary::new("Summer 2022", 7),
    ];
    let details = HashMap::from([
        ("Winter 2022".to_string(), detail("Cold Comfort")),
        ("Summer 2022".to_string(), detail("Heatwave")),
    ]);
    let (mut controller, log) = controller(Ok(phases), details);

    let outcome = controller.load_timeline().await.unwrap();

    assert_eq!(
        outcome,
        LoadOutcome::Loaded {
            populated: 2,
            failed: 1
        }
    );
    let states: Vec<&str> = controller
        .cards()
        .iter()
        .map(|card| card.state.name())
        .collect();
    assert_eq!(states, ["populated", "failed", "populated"]);

    let log = entries(&log);
    let failed_render = position(&log, "replace:phase-Autumn-2022:shown");
    assert_eq!(log[failed_render - 1], "detail:Autumn 2022");
    assert_eq!(log[failed_render + 1], "detail:Summer 2022");

    let failed = controller.card("Autumn 2022").unwrap();
    match &failed.state {
        CardState::Failed { reason } => assert!(reason.contains("no detail for Autumn 2022")),
        other => panic!("unexpected state {other:?}"),
    }
    let surface = &controller.surface().inner;
    let failed_node = surface.card(&failed.key).unwrap();
    assert!(failed_node.visible);
    assert!(failed_node.markup.contains("6 songs saved"));
    assert!(failed_node
        .markup
        .contains("Could not load details for Autumn 2022."));
    let sibling = surface.card(&CardKey::from_period("Summer 2022")).unwrap();
    assert!(sibling.markup.contains("Heatwave"));
}

#[tokio::test]
async fn end_to_end_single_phase() {
    let phases = vec![PhaseSummary::new("2020 H1", 12)];
    let details = HashMap::from([(
        "2020 H1".to_string(),
        PhaseDetail {
            ai_phase_name: "Discovery Spree".to_string(),
            ai_phase_summary: "...".to_string(),
            average_release_year: ReleaseYear::Year(2018.0),
            average_popularity: 61.0,
            sample_tracks: vec!["Song A".to_string(), "Song B".to_string()],
            top_genres: vec!["indie".to_string(), "pop".to_string()],
            phase_cover_url: "http://x/y.jpg".to_string(),
        },
    )]);
    let (mut controller, log) = controller(Ok(phases), details);

    controller.load_timeline().await.unwrap();

    let log = entries(&log);
    assert!(position(&log, "mount:phase-2020-H1") < position(&log, "detail:2020 H1"));

    let placeholder_events = controller.surface().inner.events();
    assert!(placeholder_events.iter().any(|event| matches!(
        event,
        phases_ui::SurfaceEvent::Mounted { key } if key.as_str() == "phase-2020-H1"
    )));

    let card = controller.card("2020 H1").unwrap();
    assert_eq!(card.key.as_str(), "phase-2020-H1");
    assert_eq!(card.state.detail().unwrap().ai_phase_name, "Discovery Spree");

    let node = controller.surface().inner.card(&card.key).unwrap();
    assert!(node.visible);
    assert!(node.markup.contains("Discovery Spree"));
    assert!(node.markup.contains("12 songs saved"));
    assert!(node.markup.contains("<li>Song A</li><li>Song B</li>"));
    assert_eq!(node.markup.matches(r#"class="tag""#).count(), 2);
    assert!(node.markup.contains("Avg. Release Year: 2018"));
    assert!(node.markup.contains("Avg. Popularity: 61/100"));
    assert!(node.style.background.is_some());
    assert!(node.style.foreground.is_some());
}

#[tokio::test]
async fn placeholder_is_visible_immediately() {
    let phases = vec![PhaseSummary::new("2020 H1", 12)];
    let (mut controller, _log) = controller(Ok(phases), HashMap::new());

    controller.load_timeline().await.unwrap();

    let node = controller
        .surface()
        .inner
        .card(&CardKey::from_period("2020 H1"))
        .unwrap();
    assert!(node.visible);
    assert!(node.markup.contains("12 songs saved"));
    assert_eq!(node.style.background, None);
}

#[tokio::test]
async fn second_load_is_rejected() {
    let phases = vec![PhaseSummary::new("2020 H1", 12)];
    let details = HashMap::from([("2020 H1".to_string(), detail("Once"))]);
    let (mut controller, log) = controller(Ok(phases), details);

    controller.load_timeline().await.unwrap();
    let calls = entries(&log).len();
    let err = controller.load_timeline().await.unwrap_err();

    assert!(matches!(err, UiError::Timeline(TimelineError::AlreadyLoaded)));
    assert_eq!(entries(&log).len(), calls);
    assert_eq!(controller.cards().len(), 1);
}

#[tokio::test]
async fn colliding_labels_get_distinct_nodes() {
    let phases = vec![
        PhaseSummary::new("Early 2020 Spring", 1),
        PhaseSummary::new("Early-2020 Spring", 2),
    ];
    let (mut controller, log) = controller(Ok(phases), HashMap::new());

    controller.load_timeline().await.unwrap();

    let log = entries(&log);
    assert!(log.contains(&"mount:phase-Early-2020-Spring".to_string()));
    assert!(log.contains(&"mount:phase-Early-2020-Spring-1".to_string()));
    assert_eq!(controller.surface().inner.cards().len(), 2);
    assert_eq!(
        controller.card("Early-2020 Spring").unwrap().key.as_str(),
        "phase-Early-2020-Spring-1"
    );
}

#[tokio::test]
async fn surface_failure_is_isolated_to_its_card() {
    let phases = vec![PhaseSummary::new("A 1", 1), PhaseSummary::new("B 2", 2)];
    let details = phases
        .iter()
        .map(|p| (p.phase_period.clone(), detail(&p.phase_period)))
        .collect();
    let (mut controller, log) =
        controller_with_removed_node(Ok(phases), details, Some(CardKey::from_period("A 1")));

    let outcome = controller.load_timeline().await.unwrap();

    assert_eq!(
        outcome,
        LoadOutcome::Loaded {
            populated: 1,
            failed: 1
        }
    );
    let log = entries(&log);
    assert!(position(&log, "replace:phase-A-1:hidden") < position(&log, "detail:B 2"));
    assert!(!log.contains(&"visible:phase-A-1".to_string()));

    let states: Vec<&str> = controller
        .cards()
        .iter()
        .map(|card| card.state.name())
        .collect();
    assert_eq!(states, ["failed", "populated"]);
    match &controller.card("A 1").unwrap().state {
        CardState::Failed { reason } => assert!(reason.contains("node gone")),
        other => panic!("unexpected state {other:?}"),
    }

    let surface = &controller.surface().inner;
    let sibling = surface.card(&CardKey::from_period("B 2")).unwrap();
    assert!(sibling.visible);
    assert!(sibling.markup.contains("All about B 2."));
}
