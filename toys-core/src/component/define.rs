//! Component definitions.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::instance::Instance;
use super::props::Props;
use super::render::RenderContext;
use super::value::{coerce_attribute, Coercer, Value};
use crate::dom::{CustomElementDefinition, ElementReactions, Node, ShadowRootInit};
use crate::error::ComponentError;
use crate::reactive::Signal;

type RenderFn = Rc<dyn Fn(&mut RenderContext<'_>) -> Result<String, ComponentError>>;

struct Definition {
    render: RenderFn,
    shadow_init: ShadowRootInit,
    props: IndexMap<String, Coercer>,
    /// Markup from the probe; empty when the probe failed or rendered nothing.
    template: String,
}

/// A custom element class produced by [`define_component`].
///
/// Register it on a document with [`Document::define`](crate::dom::Document::define).
#[derive(Clone)]
pub struct ComponentClass(Rc<Definition>);

/// Turn a render function into a custom element class.
///
/// The render function runs once right away in probe mode to learn the
/// shadow-root options, the declared props and, when it succeeds, the
/// template markup. A probe failure is expected for render functions that
/// need an element and is only logged.
///
/// Each constructed element then:
///
/// 1. attaches a shadow root with the probed options,
/// 2. receives the probed markup, if any,
/// 3. seeds one signal per declared prop from its attribute,
/// 4. runs the render function in instance mode; the result becomes the
///    shadow content only when the probe produced none,
/// 5. keeps the lifecycle callbacks that render registered.
///
/// ```rust
/// use toys_core::component::{coerce, define_component};
/// use toys_core::dom::{Document, ShadowRootInit};
///
/// let counter = define_component(|cx| {
///     cx.use_shadow_root(ShadowRootInit::open());
///     cx.use_props(&[("count", coerce::number)]);
///     Ok("<span></span>".to_string())
/// });
///
/// let doc = Document::new();
/// doc.define("x-counter", counter).unwrap();
/// ```
pub fn define_component<F>(render: F) -> ComponentClass
where
    F: Fn(&mut RenderContext<'_>) -> Result<String, ComponentError> + 'static,
{
    let render: RenderFn = Rc::new(render);
    let mut cx = RenderContext::probe();
    let template = match render(&mut cx) {
        Ok(markup) => markup,
        Err(error) => {
            tracing::debug!(%error, "component probe failed");
            String::new()
        }
    };
    let (shadow_init, props) = cx.into_declarations();
    tracing::debug!(props = props.len(), mode = ?shadow_init.mode, "component defined");

    ComponentClass(Rc::new(Definition {
        render,
        shadow_init,
        props,
        template,
    }))
}

impl ComponentClass {
    pub fn shadow_root_init(&self) -> &ShadowRootInit {
        &self.0.shadow_init
    }

    /// Declared prop names, in declaration order.
    pub fn prop_names(&self) -> Vec<String> {
        self.0.props.keys().cloned().collect()
    }

    /// Attribute name to `(prop name, coercer)`. Attribute names are the
    /// lowercase prop names; a later prop wins a collision.
    fn attribute_map(&self) -> IndexMap<String, (String, Coercer)> {
        self.0
            .props
            .iter()
            .map(|(name, coerce)| (name.to_ascii_lowercase(), (name.clone(), *coerce)))
            .collect()
    }

    /// Markup captured by the probe.
    pub fn template(&self) -> &str {
        &self.0.template
    }

    fn instantiate(&self, element: &Node) -> Result<Rc<Instance>, ComponentError> {
        let definition = &self.0;
        let root = element.attach_shadow(definition.shadow_init.clone())?;
        if !definition.template.is_empty() {
            root.set_inner_html(&definition.template)?;
        }

        let signals = definition
            .props
            .iter()
            .map(|(name, coerce)| {
                let raw = coerce_attribute(element.get_attribute(name).as_deref());
                (name.clone(), Signal::new(coerce(raw)))
            })
            .collect();
        let props = Props::new(signals);
        let instance = Rc::new(Instance::new(props.clone(), root.clone(), self.attribute_map()));

        let mut cx = RenderContext::instance(element, root.clone(), props);
        match (definition.render)(&mut cx) {
            Ok(markup) => {
                let (lifecycle, owned) = cx.into_registrations();
                instance.install(lifecycle, owned);
                // An empty result keeps whatever the render's watchers wrote.
                if definition.template.is_empty() && !markup.is_empty() {
                    root.set_inner_html(&markup)?;
                }
            }
            Err(error) => {
                tracing::error!(element = ?element, %error, "error loading template");
            }
        }
        Ok(instance)
    }
}

impl CustomElementDefinition for ComponentClass {
    fn observed_attributes(&self) -> Vec<String> {
        self.attribute_map().into_keys().collect()
    }

    fn construct(&self, element: &Node) -> Option<Rc<dyn ElementReactions>> {
        match self.instantiate(element) {
            Ok(instance) => Some(instance),
            Err(error) => {
                tracing::error!(element = ?element, %error, "error loading template");
                None
            }
        }
    }
}

impl fmt::Debug for ComponentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentClass")
            .field("props", &self.prop_names())
            .field("shadow_init", &self.0.shadow_init)
            .field("template", &self.0.template)
            .finish()
    }
}

/// Component accessors on element nodes.
pub trait ComponentElement {
    /// The component metadata, if this element is a constructed component.
    fn instance(&self) -> Option<Rc<Instance>>;

    fn props(&self) -> Option<Props> {
        self.instance().map(|instance| instance.props().clone())
    }

    /// Tracked read of a declared property.
    fn property(&self, name: &str) -> Option<Value> {
        let props = self.props()?;
        props.contains(name).then(|| props.get(name))
    }

    /// Reflect `value` to the attribute, then write the property signal.
    fn set_property(&self, name: &str, value: impl Into<Value>) -> Result<(), ComponentError>;
}

impl ComponentElement for Node {
    fn instance(&self) -> Option<Rc<Instance>> {
        self.custom_element()?.into_any().downcast::<Instance>().ok()
    }

    fn set_property(&self, name: &str, value: impl Into<Value>) -> Result<(), ComponentError> {
        let props = self.props().ok_or(ComponentError::NotAComponent)?;
        let signal = props
            .signal(name)
            .ok_or_else(|| ComponentError::UnknownProperty(name.to_string()))?;
        let value = value.into();
        self.set_attribute(name, &value.to_string())?;
        signal.set(value);
        Ok(())
    }
}
