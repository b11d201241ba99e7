//! Component Definition API

use std::rc::Rc;

use fos_dom::{CustomElement, CustomElementError, Document, ElementConstructor, ElementRef, NodeId};

use crate::controller::{Binding, ComponentElement, Factory, RenderFn};
use crate::{ComponentError, Config, HookContext, Hooks, Isolation, Props, Renderer};

/// Outcome of a successful `define_component`
#[derive(Debug, Clone)]
pub enum Registration {
    /// The tag was registered with this definition
    Defined(ComponentDefinition),
    /// The tag already had a definition; it was left unchanged
    AlreadyDefined,
}

impl Registration {
    pub fn is_defined(&self) -> bool {
        matches!(self, Self::Defined(_))
    }

    pub fn definition(&self) -> Option<&ComponentDefinition> {
        match self {
            Self::Defined(definition) => Some(definition),
            Self::AlreadyDefined => None,
        }
    }

    pub fn into_definition(self) -> Option<ComponentDefinition> {
        match self {
            Self::Defined(definition) => Some(definition),
            Self::AlreadyDefined => None,
        }
    }
}

/// A registered component tag
#[derive(Debug, Clone)]
pub struct ComponentDefinition {
    tag: String,
    props: Props,
    hooks: Hooks,
}

impl ComponentDefinition {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Store created by the definition-time factory run
    ///
    /// With shared isolation this is the store every element of the tag uses.
    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn observed_attributes(&self) -> &[String] {
        self.hooks.observed_attributes()
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }
}

/// Defines components into one document with one renderer
pub struct ComponentHost<R: Renderer> {
    document: Document,
    renderer: Rc<R>,
    config: Config,
}

impl<R: Renderer> ComponentHost<R> {
    pub fn new(document: Document, renderer: R) -> Self {
        Self::with_config(document, renderer, Config::default())
    }

    pub fn with_config(document: Document, renderer: R, config: Config) -> Self {
        Self {
            document,
            renderer: Rc::new(renderer),
            config,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Define `tag` as a component built by `factory`
    ///
    /// The factory runs once before this returns. It receives the hook
    /// context and props store and returns the render function. Defining a
    /// tag twice leaves the first definition in place and returns
    /// `Registration::AlreadyDefined`; only an invalid tag name is an error.
    pub fn define_component<F, V>(&self, tag: &str, factory: F) -> Result<Registration, ComponentError>
    where
        F: Fn(&HookContext, &Props) -> V + 'static,
        V: Fn(&[NodeId]) -> R::Template + 'static,
    {
        let factory: Rc<Factory<R::Template>> = Rc::new(move |cx: &HookContext, props: &Props| {
            Box::new(factory(cx, props)) as RenderFn<R::Template>
        });

        let binding = Binding::setup(tag, &*factory, self.renderer.clone(), self.config.clone());
        if self.document.is_defined(tag) {
            return Ok(Registration::AlreadyDefined);
        }

        let observed = binding.hooks.observed_attributes().to_vec();
        let definition = ComponentDefinition {
            tag: tag.to_string(),
            props: binding.props.clone(),
            hooks: binding.hooks.clone(),
        };

        let constructor: Rc<dyn ElementConstructor> = match self.config.isolation {
            Isolation::Shared => Rc::new(move |element: ElementRef| {
                ComponentElement::new(element, binding.clone()) as Rc<dyn CustomElement>
            }),
            Isolation::PerInstance => {
                let tag = tag.to_string();
                let renderer = self.renderer.clone();
                let config = self.config.clone();
                Rc::new(move |element: ElementRef| {
                    let binding = Binding::setup(&tag, &*factory, renderer.clone(), config.clone());
                    ComponentElement::new(element, binding) as Rc<dyn CustomElement>
                })
            }
        };

        match self.document.define(tag, observed, constructor) {
            Ok(()) => Ok(Registration::Defined(definition)),
            Err(CustomElementError::AlreadyDefined(_)) => Ok(Registration::AlreadyDefined),
            Err(source) => Err(ComponentError::Registry {
                tag: tag.to_string(),
                source,
            }),
        }
    }
}

/// Define `tag` in `document` with the default configuration
pub fn define_component<R, F, V>(
    document: &Document,
    renderer: R,
    tag: &str,
    factory: F,
) -> Result<Registration, ComponentError>
where
    R: Renderer,
    F: Fn(&HookContext, &Props) -> V + 'static,
    V: Fn(&[NodeId]) -> R::Template + 'static,
{
    ComponentHost::new(document.clone(), renderer).define_component(tag, factory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TextRenderer;

    #[test]
    fn test_factory_runs_once_per_call() {
        let host = ComponentHost::new(Document::new(), TextRenderer);
        assert_eq!(host.config().isolation, Isolation::Shared);
        let runs = Rc::new(std::cell::Cell::new(0));

        for _ in 0..2 {
            let runs = runs.clone();
            host.define_component("x-once", move |_: &HookContext, _: &Props| {
                runs.set(runs.get() + 1);
                |_: &[NodeId]| String::new()
            })
            .unwrap();
        }
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_invalid_tag_is_an_error() {
        let doc = Document::new();
        let err = define_component(&doc, TextRenderer, "nohyphen", |_: &HookContext, _: &Props| {
            |_: &[NodeId]| String::new()
        })
        .unwrap_err();

        assert_eq!(
            err,
            ComponentError::Registry {
                tag: "nohyphen".into(),
                source: CustomElementError::InvalidName("nohyphen".into()),
            }
        );
        assert_eq!(err.to_string(), "cannot define <nohyphen>: Invalid custom element name: nohyphen");
    }

    #[test]
    fn test_definition_exposes_setup_results() {
        let doc = Document::new();
        let registration = define_component(&doc, TextRenderer, "x-def", |cx: &HookContext, props: &Props| {
            cx.observe_attribute("open");
            cx.register_styles(["dark"]);
            props.set("open", true);
            |_: &[NodeId]| String::new()
        })
        .unwrap();

        let definition = registration.definition().unwrap();
        assert_eq!(definition.tag(), "x-def");
        assert_eq!(definition.observed_attributes(), &["open", "dark"]);
        assert_eq!(definition.props().peek("open"), crate::PropValue::Bool(true));
        assert!(doc.is_defined("x-def"));
    }
}
