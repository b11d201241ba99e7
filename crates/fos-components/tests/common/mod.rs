//! Shared test helpers

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use fos_components::Renderer;
use fos_dom::{DomError, ElementRef};

/// Renders text like `TextRenderer` and records every call
#[derive(Clone, Default)]
pub struct CountingRenderer {
    pub renders: Rc<Cell<usize>>,
    pub templates: Rc<RefCell<Vec<String>>>,
}

impl CountingRenderer {
    pub fn count(&self) -> usize {
        self.renders.get()
    }

    pub fn last(&self) -> Option<String> {
        self.templates.borrow().last().cloned()
    }
}

impl Renderer for CountingRenderer {
    type Template = String;
    type Error = DomError;

    fn render(&self, template: String, host: &ElementRef) -> Result<(), DomError> {
        self.renders.set(self.renders.get() + 1);
        self.templates.borrow_mut().push(template.clone());
        host.set_text_content(&template)
    }
}

/// Template outcome for `FallibleRenderer`
pub enum Outcome {
    Ok(String),
    Fail,
}

#[derive(Debug)]
pub struct RenderFailed;

impl fmt::Display for RenderFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("template rejected")
    }
}

impl std::error::Error for RenderFailed {}

/// Fails whenever the template asks it to
#[derive(Clone, Default)]
pub struct FallibleRenderer {
    pub attempts: Rc<Cell<usize>>,
}

impl Renderer for FallibleRenderer {
    type Template = Outcome;
    type Error = RenderFailed;

    fn render(&self, template: Outcome, host: &ElementRef) -> Result<(), RenderFailed> {
        self.attempts.set(self.attempts.get() + 1);
        match template {
            Outcome::Ok(text) => host.set_text_content(&text).map_err(|_| RenderFailed),
            Outcome::Fail => Err(RenderFailed),
        }
    }
}

/// Shared log of hook invocations
pub type Log = Rc<RefCell<Vec<String>>>;

pub fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}
