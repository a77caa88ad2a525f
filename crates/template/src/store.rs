//! Editor state container. Actions go through [`reduce`], which builds the next
//! state without touching the current one, so a failed action leaves the
//! editor exactly as it was.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    section_at_fraction, validate_zoom, CanvasViewport, CommandHistory, DragPayload,
    DragSourceRegistry, EditorCommand, Element, ElementId, Position, SectionId, Template,
    TemplateError,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditorState {
    pub template: Template,
    pub history: CommandHistory,
    pub selected_section: Option<SectionId>,
    pub selected_element: Option<ElementId>,
    pub viewport: CanvasViewport,
}

impl EditorState {
    pub fn new(template: Template) -> Self {
        Self {
            template,
            ..Self::default()
        }
    }

    fn prune_selection(&mut self) {
        if let Some(id) = self.selected_section {
            if self.template.section(id).is_none() {
                self.selected_section = None;
            }
        }
        if let Some(id) = self.selected_element {
            if self.template.find_element(id).is_none() {
                self.selected_element = None;
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EditorAction {
    Apply {
        command: EditorCommand,
    },
    Undo,
    Redo,
    SelectSection {
        section_id: Option<SectionId>,
    },
    SelectElement {
        element_id: Option<ElementId>,
    },
    SetViewport {
        viewport: CanvasViewport,
    },
    ClickTimeline {
        fraction: f64,
    },
    Drop {
        payload: String,
        section_id: SectionId,
        client_x: f64,
        client_y: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dispatched {
    Applied,
    Selected(Option<SectionId>),
    Dropped(ElementId),
}

pub fn reduce(
    state: &EditorState,
    palette: &DragSourceRegistry,
    action: EditorAction,
) -> Result<(EditorState, Dispatched), TemplateError> {
    let mut next = state.clone();
    let outcome = match action {
        EditorAction::Apply { command } => {
            next.history.apply(&mut next.template, command)?;
            next.template.touch();
            Dispatched::Applied
        }
        EditorAction::Undo => {
            next.history.undo(&mut next.template)?;
            next.template.touch();
            Dispatched::Applied
        }
        EditorAction::Redo => {
            next.history.redo(&mut next.template)?;
            next.template.touch();
            Dispatched::Applied
        }
        EditorAction::SelectSection { section_id } => {
            if let Some(id) = section_id {
                if next.template.section(id).is_none() {
                    return Err(TemplateError::SectionNotFound(id));
                }
            }
            next.selected_section = section_id;
            let element_in_section = match (section_id, next.selected_element) {
                (Some(sid), Some(eid)) => next
                    .template
                    .find_element(eid)
                    .is_some_and(|(section, _)| section.id == sid),
                _ => false,
            };
            if !element_in_section {
                next.selected_element = None;
            }
            Dispatched::Selected(section_id)
        }
        EditorAction::SelectElement { element_id } => {
            if let Some(id) = element_id {
                let (section, _) = next
                    .template
                    .find_element(id)
                    .ok_or(TemplateError::ElementNotFound(id))?;
                next.selected_section = Some(section.id);
            }
            next.selected_element = element_id;
            Dispatched::Selected(next.selected_section)
        }
        EditorAction::SetViewport { viewport } => {
            validate_zoom(viewport.zoom)?;
            next.viewport = viewport;
            Dispatched::Applied
        }
        EditorAction::ClickTimeline { fraction } => {
            let hit = section_at_fraction(&next.template.sections, fraction)
                .map(|idx| next.template.sections[idx].id);
            next.selected_section = hit;
            next.selected_element = None;
            Dispatched::Selected(hit)
        }
        EditorAction::Drop {
            payload,
            section_id,
            client_x,
            client_y,
        } => {
            let element_id = drop_into(&mut next, palette, &payload, section_id, client_x, client_y)?;
            Dispatched::Dropped(element_id)
        }
    };
    next.prune_selection();
    Ok((next, outcome))
}

fn drop_into(
    state: &mut EditorState,
    palette: &DragSourceRegistry,
    raw_payload: &str,
    section_id: SectionId,
    client_x: f64,
    client_y: f64,
) -> Result<ElementId, TemplateError> {
    let payload = DragPayload::decode(raw_payload).inspect_err(|e| {
        warn!(error = %e, "rejecting drop with malformed payload");
    })?;
    let item = palette.lookup(&payload).inspect_err(|e| {
        warn!(error = %e, payload_id = %payload.id, "rejecting drop of unknown palette item");
    })?;
    if state.template.section(section_id).is_none() {
        warn!(section = %section_id, item = %item.id, "drop target section does not exist");
        return Err(TemplateError::SectionNotFound(section_id));
    }
    let point = state.viewport.resolve(client_x, client_y)?;

    let mut element = Element::new(
        item.placeholder_kind()?,
        Position::new(point.x, point.y, 0),
        item.default_size,
    );
    // New elements stack above whatever the section already holds.
    element.position.z = state
        .template
        .section(section_id)
        .and_then(|s| s.elements.iter().map(|e| e.position.z).max())
        .map_or(0, |z| z.saturating_add(1));
    let element_id = element.id;

    state.history.apply(
        &mut state.template,
        EditorCommand::AddElement {
            section_id,
            element,
            index: None,
        },
    )?;
    state.template.touch();
    state.selected_section = Some(section_id);
    state.selected_element = Some(element_id);
    debug!(element = %element_id, section = %section_id, x = point.x, y = point.y, "element dropped");
    Ok(element_id)
}

/// Owns the editor state for one editing session and the palette drops are resolved against.
#[derive(Debug, Clone)]
pub struct EditorStore {
    state: EditorState,
    palette: DragSourceRegistry,
}

impl EditorStore {
    pub fn new(template: Template) -> Self {
        Self {
            state: EditorState::new(template),
            palette: DragSourceRegistry::stock(),
        }
    }

    pub fn with_palette(mut self, palette: DragSourceRegistry) -> Self {
        self.palette = palette;
        self
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn template(&self) -> &Template {
        &self.state.template
    }

    pub fn palette(&self) -> &DragSourceRegistry {
        &self.palette
    }

    pub fn into_template(self) -> Template {
        self.state.template
    }

    pub fn dispatch(&mut self, action: EditorAction) -> Result<Dispatched, TemplateError> {
        let (next, outcome) = reduce(&self.state, &self.palette, action)?;
        self.state = next;
        Ok(outcome)
    }

    pub fn apply(&mut self, command: EditorCommand) -> Result<(), TemplateError> {
        self.dispatch(EditorAction::Apply { command }).map(|_| ())
    }

    pub fn drop_element(
        &mut self,
        raw_payload: &str,
        section_id: SectionId,
        client_x: f64,
        client_y: f64,
    ) -> Result<ElementId, TemplateError> {
        match self.dispatch(EditorAction::Drop {
            payload: raw_payload.to_string(),
            section_id,
            client_x,
            client_y,
        })? {
            Dispatched::Dropped(id) => Ok(id),
            other => Err(TemplateError::InvalidOp(format!(
                "drop produced unexpected outcome {:?}",
                other
            ))),
        }
    }

    pub fn set_viewport(&mut self, viewport: CanvasViewport) -> Result<(), TemplateError> {
        self.dispatch(EditorAction::SetViewport { viewport }).map(|_| ())
    }

    pub fn click_timeline(&mut self, fraction: f64) -> Option<SectionId> {
        match self.dispatch(EditorAction::ClickTimeline { fraction }) {
            Ok(Dispatched::Selected(hit)) => hit,
            _ => None,
        }
    }
}
