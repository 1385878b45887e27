use cgmath::Point2;
use parking_lot::Mutex;
use perch::events::{PointerDevice, RawInput, RawKind};
use perch::{
    Card, Context, Control, DataSource, EventKind, Focus, Focusable, Handler, Host, HostMessage,
    InputEvent, Interface, List, Navigable, Phase, Rect, Renderable, Scroller, Selectable, Stack,
    Style, SurfaceId, TagRegistry, Value, View,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn settle(ctx: &Context) {
    ctx.scheduler().advance(Duration::from_millis(300));
}

fn counter<T: 'static>() -> (Arc<AtomicUsize>, Handler<T>) {
    let count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&count);
    let handler = Handler::new(move |_: &T, _, _| {
        c.fetch_add(1, Ordering::SeqCst);
    });
    (count, handler)
}

#[test]
fn subscriber_receives_payload_owner_and_no_data() {
    let ctx = Context::default();
    let view = View::new(&ctx, Value::Empty);
    let owner = view.object_id();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = Arc::clone(&seen);
    let handler = Handler::new(move |payload: &Value, owner, data: Option<&Value>| {
        s.lock().push((payload.clone(), owner, data.cloned()));
    });
    view.change_event().subscribe(&handler, Some(owner), None);

    view.change_event().fire(&Value::from("x"));
    assert_eq!(*seen.lock(), vec![(Value::from("x"), Some(owner), None)]);
}

#[test]
fn push_then_pop_restores_page() {
    let ctx = Context::default();
    let doc = ctx.document();
    let a = Card::new(&ctx, "a".into());
    let b = Card::new(&ctx, "b".into());
    let stack = Stack::new(&ctx, Value::from(a.clone()));
    stack.attach(None);
    settle(&ctx);
    let surface = stack.surface().unwrap();
    let before = doc.children(surface);

    stack.push(Value::from(b.clone()));
    settle(&ctx);
    assert_eq!(doc.children(surface), vec![b.surface().unwrap()]);

    stack.pop();
    settle(&ctx);
    assert_eq!(doc.children(surface), before);
    assert_eq!(stack.index(), 0);
    assert_eq!(stack.transition_phase(), Phase::Idle);
}

#[test]
fn pop_deactivates_removed_page_once() {
    let ctx = Context::default();
    let a = Card::new(&ctx, "a".into());
    let b = Card::new(&ctx, "b".into());
    let (deactivated, handler) = counter::<()>();
    b.deactivate_event().subscribe(&handler, None, None);
    let (activated, handler) = counter::<()>();
    b.activate_event().subscribe(&handler, None, None);
    let (pops, handler) = counter::<()>();

    let stack = Stack::new(&ctx, Value::Empty);
    stack.pop_event().subscribe(&handler, None, None);
    stack.push(Value::from(a.clone()));
    stack.push(Value::from(b.clone()));
    assert_eq!(stack.index(), 1);
    assert_eq!(activated.load(Ordering::SeqCst), 1);

    stack.pop();
    assert_eq!(stack.index(), 0);
    assert_eq!(deactivated.load(Ordering::SeqCst), 1);
    assert_eq!(pops.load(Ordering::SeqCst), 1);

    // locked: the first page stays
    stack.pop();
    assert_eq!(stack.len(), 1);
    assert_eq!(deactivated.load(Ordering::SeqCst), 1);
}

#[test]
fn navigation_through_trait_object() {
    let ctx = Context::default();
    let stack = Stack::new(&ctx, "home".into());
    let nav: &dyn Navigable = &*stack;
    nav.push("one".into());
    nav.push("two".into());
    nav.back();
    assert_eq!(stack.index(), 1);
    nav.home();
    assert_eq!(stack.len(), 1);
    nav.forward();
    assert_eq!(stack.index(), 0);
}

#[test]
fn unlocked_stack_hides_when_emptied() {
    let ctx = Context::default();
    let page = Card::new(&ctx, "only".into());
    let stack = Stack::new(&ctx, Value::from(page.clone()));
    stack.set_locked(false);
    stack.show();
    let (hides, handler) = counter::<()>();
    stack.hide_event().subscribe(&handler, None, None);

    stack.pop();
    assert!(stack.is_empty());
    assert!(!stack.is_visible());
    assert!(ctx.document().children(stack.surface().unwrap()).is_empty());
    assert_eq!(hides.load(Ordering::SeqCst), 0);
    ctx.scheduler().advance(Duration::from_millis(500));
    assert_eq!(hides.load(Ordering::SeqCst), 1);
}

#[test]
fn auto_sorted_list_renders_in_order() {
    let ctx = Context::default();
    let doc = ctx.document();
    let list = List::new(&ctx, Value::Empty);
    list.set_auto_sort(true);
    list.set_data(Value::from(vec!["a", "c", "b"]));

    let rendered: Vec<String> = doc
        .children(list.surface().unwrap())
        .into_iter()
        .map(|row| doc.text(row))
        .collect();
    assert_eq!(rendered, vec!["a", "b", "c"]);
}

#[test]
fn list_click_selects_row() {
    let ctx = Context::default();
    let doc = ctx.document();
    let list = List::new(&ctx, Value::from(vec!["one", "two", "three"]));
    list.attach(None);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = Arc::clone(&seen);
    list.select_event().subscribe(
        &Handler::new(move |row: &usize, _, _| s.lock().push(*row)),
        None,
        None,
    );

    let rows = doc.children(list.surface().unwrap());
    ctx.dispatch(InputEvent::new(EventKind::Click, rows[2]));
    assert_eq!(list.index(), Some(2));
    assert!(doc.has_class(rows[2], "selected"));
    assert_eq!(*seen.lock(), vec![2]);

    list.deselect();
    assert_eq!(list.index(), None);
    assert!(!doc.has_class(rows[2], "selected"));
}

#[test]
fn select_reports_data_position_when_rows_are_skipped() {
    let ctx = Context::default();
    let doc = ctx.document();
    let list = List::new(&ctx, Value::Empty);
    list.set_formatter(|item, _| match item.to_html().as_str() {
        "hidden" => None,
        text => Some(Value::from(text.to_uppercase())),
    });
    list.set_data(Value::from(vec!["first", "hidden", "last"]));
    list.attach(None);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = Arc::clone(&seen);
    list.select_event().subscribe(
        &Handler::new(move |position: &usize, _, _| s.lock().push(*position)),
        None,
        None,
    );

    let rows = doc.children(list.surface().unwrap());
    assert_eq!(rows.len(), 2);
    ctx.dispatch(InputEvent::new(EventKind::Click, rows[1]));
    assert_eq!(list.index(), Some(1));
    assert_eq!(*seen.lock(), vec![2]);
    assert_eq!(list.item(2), Some(Value::from("last")));
}

#[test]
fn cleared_list_shows_default_message() {
    let ctx = Context::default();
    let doc = ctx.document();
    let list = List::new(&ctx, Value::from(vec!["one", "two"]));
    list.set_default("Nothing here".into());
    list.attach(None);
    let (changes, handler) = counter::<Value>();
    list.view().change_event().subscribe(&handler, None, None);

    let rows = doc.children(list.surface().unwrap());
    ctx.dispatch(InputEvent::new(EventKind::Click, rows[1]));
    assert_eq!(list.index(), Some(1));

    list.clear();
    let surface = list.surface().unwrap();
    assert_eq!(list.index(), None);
    assert_eq!(list.len(), 0);
    assert!(doc.children(surface).is_empty());
    assert_eq!(doc.html(surface).as_deref(), Some("Nothing here"));
    assert_eq!(changes.load(Ordering::SeqCst), 1);

    list.set_data(Value::from(vec!["three"]));
    assert_eq!(doc.children(surface).len(), 1);
    assert_eq!(list.index(), None);
}

#[test]
fn cleared_stack_is_empty_and_hidden() {
    let ctx = Context::default();
    let doc = ctx.document();
    let home = Card::new(&ctx, "home".into());
    let stack = Stack::new(&ctx, Value::from(home.clone()));
    stack.show();
    stack.push(Value::from(Card::new(&ctx, "detail".into())));
    settle(&ctx);
    assert_eq!(stack.len(), 2);

    stack.clear();
    assert!(stack.is_locked());
    assert!(stack.is_empty());
    assert_eq!(stack.index(), 0);
    assert_eq!(stack.data(), Value::Empty);
    assert!(!stack.is_visible());
    assert!(doc.children(stack.surface().unwrap()).is_empty());
    settle(&ctx);
    assert!(doc.children(stack.surface().unwrap()).is_empty());
}

fn drag_scroller(ctx: &Context, content: f64, viewport: f64) -> (Arc<Scroller>, SurfaceId) {
    let doc = ctx.document();
    let page = View::new(ctx, "long content".into());
    let scroller = Scroller::new(ctx, Value::from(page.clone()));
    scroller.attach(None);
    doc.set_bounds(
        scroller.surface().unwrap(),
        Rect::from_xywh(0., 0., 320., viewport),
    );
    let node = page.surface().unwrap();
    doc.set_bounds(node, Rect::from_xywh(0., 0., 320., content));
    (scroller, node)
}

fn pointer(ctx: &Context, kind: EventKind, target: SurfaceId, y: f64) -> InputEvent {
    ctx.dispatch(InputEvent::pointer(
        kind,
        target,
        Point2::new(10., y),
        PointerDevice::Touch,
    ))
}

#[test]
fn slow_drag_snaps_back() {
    let ctx = Context::default();
    let (scroller, node) = drag_scroller(&ctx, 1000., 400.);

    pointer(&ctx, EventKind::PointerDown, node, 100.);
    assert!(scroller.in_motion());
    for y in &[101., 102., 103.] {
        pointer(&ctx, EventKind::PointerMove, node, *y);
    }
    assert_eq!(scroller.top(), 3.);
    pointer(&ctx, EventKind::PointerUp, node, 103.);

    assert!(!scroller.in_motion());
    assert_eq!(scroller.top(), 0.);
    assert!(ctx.document().has_class(node, "flickback"));
}

#[test]
fn fast_drag_flicks() {
    let ctx = Context::default();
    let doc = ctx.document();
    let (scroller, node) = drag_scroller(&ctx, 1000., 400.);

    pointer(&ctx, EventKind::PointerDown, node, 100.);
    for y in &[80., 60., 40.] {
        pointer(&ctx, EventKind::PointerMove, node, *y);
    }
    assert_eq!(scroller.samples().len(), 4);
    pointer(&ctx, EventKind::PointerUp, node, 40.);

    assert_eq!(scroller.top(), -300.);
    assert!(doc.has_class(node, "flick"));
    assert_eq!(
        doc.style_property(node, "transform").as_deref(),
        Some("translate3d(0, -300px, 0)")
    );

    // the click ending a drag is swallowed
    let click = ctx.dispatch(InputEvent::new(EventKind::Click, node));
    assert!(click.is_stopped());
    assert!(click.is_default_prevented());
    let click = ctx.dispatch(InputEvent::new(EventKind::Click, node));
    assert!(!click.is_stopped());
}

#[test]
fn overscrolling_flick_is_fast_and_snaps_back_after_transition() {
    let ctx = Context::default();
    let doc = ctx.document();
    let (scroller, node) = drag_scroller(&ctx, 1000., 400.);

    pointer(&ctx, EventKind::PointerDown, node, 100.);
    for y in &[110., 120., 130.] {
        pointer(&ctx, EventKind::PointerMove, node, *y);
    }
    pointer(&ctx, EventKind::PointerUp, node, 130.);
    assert!(doc.has_class(node, "flickfast"));
    assert_eq!(scroller.top(), 50.);

    ctx.dispatch(InputEvent::new(EventKind::TransitionEnd, node));
    assert_eq!(scroller.top(), 0.);
    assert!(doc.has_class(node, "flickback"));
}

#[test]
fn stale_samples_are_trimmed() {
    let ctx = Context::default();
    let (scroller, node) = drag_scroller(&ctx, 1000., 400.);

    pointer(&ctx, EventKind::PointerDown, node, 100.);
    pointer(&ctx, EventKind::PointerMove, node, 90.);
    pointer(&ctx, EventKind::PointerMove, node, 80.);
    assert_eq!(scroller.samples().len(), 3);
    ctx.scheduler().advance(Duration::from_millis(150));
    assert_eq!(scroller.samples().len(), 1);

    // a slow drag no longer counts as a flick
    pointer(&ctx, EventKind::PointerUp, node, 80.);
    assert!(ctx.document().has_class(node, "flickback"));
    assert_eq!(scroller.top(), -20.);
}

#[test]
fn focus_moves_between_controls() {
    let ctx = Context::default();
    let doc = ctx.document();
    let first = Control::new(&ctx, "first".into());
    let second = Control::new(&ctx, "second".into());
    first.attach(None);
    second.attach(None);
    let (changes, handler) = counter::<Value>();
    first.view().change_event().subscribe(&handler, None, None);

    ctx.dispatch(InputEvent::new(EventKind::Focus, first.surface().unwrap()));
    assert!(doc.has_class(first.surface().unwrap(), "focus"));
    ctx.dispatch(InputEvent::new(EventKind::Focus, second.surface().unwrap()));
    assert!(!doc.has_class(first.surface().unwrap(), "focus"));
    assert!(doc.has_class(second.surface().unwrap(), "focus"));
    assert_eq!(changes.load(Ordering::SeqCst), 1);

    let holder = ctx.focus().get().map(|c| c.object_id());
    assert_eq!(holder, Some(Focusable::object_id(&*second)));

    ctx.dispatch(InputEvent::new(EventKind::Blur, second.surface().unwrap()));
    assert!(ctx.focus().get().is_none());
    assert!(!doc.has_class(second.surface().unwrap(), "focus"));
}

#[test]
fn standalone_focus_service() {
    let focus = Focus::new();
    assert!(focus.get().is_none());
    focus.refresh();
    focus.clear();
    assert!(focus.get().is_none());
}

#[test]
fn data_source_drives_bound_controls() {
    let ctx = Context::default();
    let source = DataSource::new(Value::Empty);
    let control = Control::with_source(&ctx, &source);
    let list = List::new(&ctx, Value::Empty);
    perch::DataBound::set_data_source(&*list, &source);

    source.set_data(Value::from(vec!["x", "y"]));
    assert_eq!(list.len(), 2);
    assert_eq!(control.data(), Value::from(vec!["x", "y"]));

    let doc = ctx.document();
    let rendered = doc.text(control.surface().unwrap());
    assert_eq!(rendered, "xy");
}

#[test]
fn host_drives_transitions() {
    let ctx = Context::default();
    let doc = ctx.document();
    let mut host = Host::new(ctx.clone());
    let sender = host.sender();

    let a = Card::new(&ctx, "a".into());
    let b = Card::new(&ctx, "b".into());
    let stack = Stack::new(&ctx, Value::from(a.clone()));
    stack.attach(None);
    sender.send(HostMessage::Tick(Duration::from_millis(300))).unwrap();
    host.poll();

    stack.push(Value::from(b.clone()));
    sender.send(HostMessage::Tick(Duration::from_millis(1))).unwrap();
    host.poll();
    assert_eq!(stack.transition_phase(), Phase::Settling);

    sender
        .send(HostMessage::TransitionEnd(b.surface().unwrap()))
        .unwrap();
    host.poll();
    assert_eq!(stack.transition_phase(), Phase::Idle);
    assert_eq!(
        doc.children(stack.surface().unwrap()),
        vec![b.surface().unwrap()]
    );

    // the timeout fires later but finds nothing to do
    sender.send(HostMessage::Tick(Duration::from_millis(300))).unwrap();
    host.poll();
    assert_eq!(
        doc.children(stack.surface().unwrap()),
        vec![b.surface().unwrap()]
    );
}

#[test]
fn host_input_is_normalized() {
    let ctx = Context::default();
    let mut host = Host::new(ctx.clone());
    let control = Control::new(&ctx, "tap".into());
    control.attach(None);
    let (selects, handler) = counter::<Value>();
    control.select_event().subscribe(&handler, None, None);

    host.sender()
        .send(HostMessage::Input(RawInput::touch(
            control.surface().unwrap(),
            RawKind::Click,
            vec![Point2::new(5., 5.)],
        )))
        .unwrap();
    assert_eq!(host.poll(), 1);
    assert_eq!(selects.load(Ordering::SeqCst), 1);
}

#[test]
fn interface_from_markup() {
    let ctx = Context::default();
    let doc = ctx.document();
    let id = |name: &str| Style::Props(vec![("id".to_string(), name.to_string())]);
    let stack = doc.create("jostack", Some(&id("nav"))).unwrap();
    let card = doc.create("jocard", Some(&id("main"))).unwrap();
    let list = doc.create("jolist", Some(&id("items"))).unwrap();
    doc.append_child(doc.root(), stack);
    doc.append_child(stack, card);
    doc.append_child(card, list);

    let ui = Interface::build(&ctx, &TagRegistry::with_defaults(), None);
    let nav = ui.get_as::<Stack>("nav").unwrap();
    let items = ui.get_as::<List>("items").unwrap();
    assert_eq!(nav.len(), 1);
    assert_eq!(doc.element_by_id("items"), Some(list));

    items.set_data(Value::from(vec!["a", "b"]));
    assert_eq!(doc.children(list).len(), 2);
    assert_eq!(ui.surface("main"), Some(card));
}
