use super::*;
use crate::render::compositor::CompositorOpts;

#[test]
fn drains_in_posting_order() {
    let d = UiDispatcher::new();
    let tx = d.sender();
    tx.request_render();
    tx.run_later(|_| Ok(()));
    tx.request_render();
    let msgs = d.drain().unwrap();
    assert_eq!(msgs.len(), 3);
    assert!(matches!(msgs[0], UiMessage::RequestRender));
    assert!(matches!(msgs[1], UiMessage::Run(_)));
    assert!(d.drain().unwrap().is_empty());
}

#[test]
fn workers_post_but_only_the_owner_drains() {
    let d = UiDispatcher::new();
    let tx = d.sender();
    let handle = std::thread::spawn(move || tx.request_render());
    handle.join().unwrap();
    assert_eq!(d.drain().unwrap().len(), 1);
    assert!(d.is_owner_thread());

    std::thread::scope(|s| {
        s.spawn(|| {
            assert!(!d.is_owner_thread());
            assert!(matches!(d.check_thread(), Err(ComposerError::WrongThread(_))));
            assert!(d.drain().is_err());
        });
    });
}

#[test]
fn posting_after_the_dispatcher_is_gone_is_harmless() {
    let tx = UiDispatcher::new().sender();
    tx.request_render();
    tx.run_later(|_| Ok(()));
}

#[test]
fn builtin_context_shares_its_undo_log() {
    let (cx, log) = AppContext::with_builtins();
    assert!(cx.catalog.module_types().contains(&"Solid"));
    cx.undo.register(None, "first edit");
    assert_eq!(log.registrations(), 1);

    let opts = CompositorOpts::default().with_clear_rgba(Some([1, 2, 3, 4]));
    let cx = cx.with_opts(opts);
    assert_eq!(cx.opts.clear_rgba, Some([1, 2, 3, 4]));
}
