//! Step renderer contract.
//!
//! Renderers are stateless: they read a [`StepView`] and report edits through
//! a [`ChangeSink`]. The controller applies the queued edits afterwards, so a
//! renderer never mutates the draft directly.

use std::marker::PhantomData;

use serde::Serialize;

use super::{ValidationErrors, WizardFlavor};
use crate::models::{Draft, FieldKey, FieldValue, WizardStep};

/// Read-only inputs handed to a renderer.
pub struct StepView<'a, K, D: Draft> {
    pub step: &'a WizardStep<K>,
    pub data: &'a D,
    pub errors: &'a ValidationErrors<D::Field>,
}

impl<K, D: Draft> StepView<'_, K, D> {
    pub fn value(&self, field: D::Field) -> FieldValue {
        self.data.get(field)
    }

    pub fn error(&self, field: D::Field) -> Option<&str> {
        self.errors.get(field)
    }
}

/// Queue of `(field, value)` edits emitted during one render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSink<F> {
    changes: Vec<(F, FieldValue)>,
}

impl<F> Default for ChangeSink<F> {
    fn default() -> Self {
        Self {
            changes: Vec::new(),
        }
    }
}

impl<F> ChangeSink<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_change(&mut self, field: F, value: impl Into<FieldValue>) {
        self.changes.push((field, value.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn changes(&self) -> &[(F, FieldValue)] {
        &self.changes
    }

    pub fn into_changes(self) -> Vec<(F, FieldValue)> {
        self.changes
    }
}

/// A step renderer. `K` is the flavor's step kind, `D` its draft.
pub trait StepRenderer<K, D: Draft> {
    type Output;

    fn render(&self, view: &StepView<'_, K, D>, sink: &mut ChangeSink<D::Field>) -> Self::Output;
}

/// A selectable option of a choice input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceOption {
    pub value: String,
    pub label: String,
}

impl ChoiceOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Widget kind of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InputKind {
    Text,
    Email,
    Phone,
    Date,
    Time,
    Number,
    Money,
    TextArea,
    Checkbox,
    Select { options: Vec<ChoiceOption> },
    Radio { options: Vec<ChoiceOption> },
    Weekdays,
}

/// One input of a step layout.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec<F> {
    pub field: F,
    pub label: &'static str,
    pub input: InputKind,
    pub required: bool,
    pub placeholder: Option<&'static str>,
}

impl<F> FieldSpec<F> {
    pub fn new(field: F, label: &'static str, input: InputKind) -> Self {
        Self {
            field,
            label,
            input,
            required: false,
            placeholder: None,
        }
    }

    pub fn text(field: F, label: &'static str) -> Self {
        Self::new(field, label, InputKind::Text)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn placeholder(mut self, placeholder: &'static str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }
}

/// Inputs and informational notes a step shows for the current draft.
#[derive(Debug, Clone, PartialEq)]
pub struct StepLayout<F> {
    pub fields: Vec<FieldSpec<F>>,
    pub notes: Vec<String>,
}

impl<F> Default for StepLayout<F> {
    fn default() -> Self {
        Self {
            fields: Vec::new(),
            notes: Vec::new(),
        }
    }
}

impl<F: Copy + PartialEq> StepLayout<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, spec: FieldSpec<F>) {
        self.fields.push(spec);
    }

    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    pub fn shows(&self, field: F) -> bool {
        self.fields.iter().any(|spec| spec.field == field)
    }
}

/// One field as presented to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedField {
    pub name: &'static str,
    pub label: &'static str,
    pub input: InputKind,
    pub required: bool,
    pub placeholder: Option<&'static str>,
    pub value: FieldValue,
    pub error: Option<String>,
}

/// Headless view model of a step, ready for any front-end.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedStep {
    pub step_id: u32,
    pub title: String,
    pub description: String,
    pub fields: Vec<RenderedField>,
    pub notes: Vec<String>,
}

impl RenderedStep {
    pub fn field(&self, name: &str) -> Option<&RenderedField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Renders any step of flavor `F` from its layout. Emits no edits.
pub struct FormRenderer<F>(PhantomData<F>);

impl<F> FormRenderer<F> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<F> Default for FormRenderer<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: WizardFlavor> StepRenderer<F::Step, F::Draft> for FormRenderer<F> {
    type Output = RenderedStep;

    fn render(
        &self,
        view: &StepView<'_, F::Step, F::Draft>,
        _sink: &mut ChangeSink<<F::Draft as Draft>::Field>,
    ) -> RenderedStep {
        let layout = F::layout(view.step.kind, view.data);
        let fields = layout
            .fields
            .into_iter()
            .map(|spec| RenderedField {
                name: spec.field.name(),
                label: spec.label,
                input: spec.input,
                required: spec.required,
                placeholder: spec.placeholder,
                value: view.value(spec.field),
                error: view.error(spec.field).map(str::to_string),
            })
            .collect();

        RenderedStep {
            step_id: view.step.id,
            title: view.step.title.clone(),
            description: view.step.description.clone(),
            fields,
            notes: layout.notes,
        }
    }
}
