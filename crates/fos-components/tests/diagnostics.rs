//! Logged diagnostics for misuse and renderer failures

mod common;

use std::io;
use std::sync::{Arc, Mutex};

use common::{FallibleRenderer, Outcome};
use fos_components::{ComponentHost, HookContext, Props, TextRenderer};
use fos_dom::{Document, ElementRef, NodeId};
use tracing_subscriber::fmt::MakeWriter;

/// Collects formatted log output
#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn contents(&self) -> String {
        let bytes = self.0.lock().map(|b| b.clone()).unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Ok(mut bytes) = self.0.lock() {
            bytes.extend_from_slice(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Capture {
    type Writer = Capture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn capture<T>(f: impl FnOnce() -> T) -> (T, String) {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, capture.contents())
}

#[test]
fn test_late_registration_is_logged_and_ignored() {
    let ((), output) = capture(|| {
        let host = ComponentHost::new(Document::new(), TextRenderer);
        let leaked = std::rc::Rc::new(std::cell::RefCell::new(None::<HookContext>));
        let slot = leaked.clone();
        let registration = host
            .define_component("x-late", move |cx: &HookContext, _: &Props| {
                *slot.borrow_mut() = Some(cx.clone());
                cx.observe_attribute("open");
                |_: &[NodeId]| String::new()
            })
            .unwrap();

        let cx = leaked.borrow_mut().take().unwrap();
        cx.observe_attribute("late");
        cx.on_mounted(|_: &ElementRef| {});
        cx.on_unmounted(|| {});

        let definition = registration.definition().unwrap();
        assert_eq!(definition.observed_attributes(), &["open"]);
        assert_eq!(definition.hooks().mounted_count(), 0);
    });

    assert!(output.contains("observe_attribute must be called inside a component"));
    assert!(output.contains("on_mounted must be called inside a component"));
    assert!(output.contains("on_unmounted must be called inside a component"));
    assert!(output.contains("ERROR"));
}

#[test]
fn test_duplicate_definition_is_silent() {
    let ((), output) = capture(|| {
        let host = ComponentHost::new(Document::new(), TextRenderer);
        for _ in 0..2 {
            host.define_component("x-twice", |_: &HookContext, _: &Props| {
                |_: &[NodeId]| String::new()
            })
            .unwrap();
        }
    });

    assert_eq!(output.matches("Defined custom element <x-twice>").count(), 1);
    assert!(!output.contains("ERROR"));
    assert!(!output.contains("WARN"));
}

#[test]
fn test_render_failure_is_logged() {
    let (attempts, output) = capture(|| {
        let doc = Document::new();
        let renderer = FallibleRenderer::default();
        let attempts = renderer.attempts.clone();
        let host = ComponentHost::new(doc.clone(), renderer);
        let registration = host
            .define_component("x-broken", |_: &HookContext, props: &Props| {
                let props = props.clone();
                move |_: &[NodeId]| {
                    if props.get("ok").is_truthy() {
                        Outcome::Ok("ok".to_string())
                    } else {
                        Outcome::Fail
                    }
                }
            })
            .unwrap();

        let el = doc.create_element("x-broken");
        doc.body().append_child(el.id()).unwrap();
        registration.definition().unwrap().props().set("ok", true);
        assert_eq!(el.text_content(), "ok");
        attempts.get()
    });

    assert_eq!(attempts, 2);
    assert_eq!(output.matches("Failed to render <x-broken>: template rejected").count(), 1);
}
