use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    model::validate_visibility, validate_duration, Element, ElementId, Position, Section,
    SectionId, Seconds, Size, Template, TemplateError,
};

/// Editor mutation. Applying one yields its inverse, which is what undo replays.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum EditorCommand {
    AddSection {
        section: Section,
        #[serde(default)]
        index: Option<usize>,
    },
    RemoveSection {
        section_id: SectionId,
    },
    MoveSection {
        section_id: SectionId,
        index: usize,
    },
    ResizeSection {
        section_id: SectionId,
        duration: Seconds,
    },
    RenameSection {
        section_id: SectionId,
        #[serde(default)]
        label: Option<String>,
    },
    AddElement {
        section_id: SectionId,
        element: Element,
        #[serde(default)]
        index: Option<usize>,
    },
    RemoveElement {
        element_id: ElementId,
    },
    MoveElement {
        element_id: ElementId,
        position: Position,
    },
    ResizeElement {
        element_id: ElementId,
        size: Size,
    },
    SetElementStyle {
        element_id: ElementId,
        style: serde_json::Value,
    },
    SetElementVisibility {
        element_id: ElementId,
        #[serde(default)]
        visible_from: Option<Seconds>,
        #[serde(default)]
        visible_to: Option<Seconds>,
    },
}

impl EditorCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddSection { .. } => "add_section",
            Self::RemoveSection { .. } => "remove_section",
            Self::MoveSection { .. } => "move_section",
            Self::ResizeSection { .. } => "resize_section",
            Self::RenameSection { .. } => "rename_section",
            Self::AddElement { .. } => "add_element",
            Self::RemoveElement { .. } => "remove_element",
            Self::MoveElement { .. } => "move_element",
            Self::ResizeElement { .. } => "resize_element",
            Self::SetElementStyle { .. } => "set_element_style",
            Self::SetElementVisibility { .. } => "set_element_visibility",
        }
    }
}

/// Apply `command` to `template`, returning the command that undoes it.
/// On error the template is left untouched.
pub fn apply_command(
    template: &mut Template,
    command: EditorCommand,
) -> Result<EditorCommand, TemplateError> {
    debug!(command = command.name(), template = %template.id, "applying editor command");
    match command {
        EditorCommand::AddSection { section, index } => add_section(template, section, index),
        EditorCommand::RemoveSection { section_id } => remove_section(template, section_id),
        EditorCommand::MoveSection { section_id, index } => {
            move_section(template, section_id, index)
        }
        EditorCommand::ResizeSection {
            section_id,
            duration,
        } => resize_section(template, section_id, duration),
        EditorCommand::RenameSection { section_id, label } => {
            rename_section(template, section_id, label)
        }
        EditorCommand::AddElement {
            section_id,
            element,
            index,
        } => add_element(template, section_id, element, index),
        EditorCommand::RemoveElement { element_id } => remove_element(template, element_id),
        EditorCommand::MoveElement {
            element_id,
            position,
        } => move_element(template, element_id, position),
        EditorCommand::ResizeElement { element_id, size } => {
            resize_element(template, element_id, size)
        }
        EditorCommand::SetElementStyle { element_id, style } => {
            set_element_style(template, element_id, style)
        }
        EditorCommand::SetElementVisibility {
            element_id,
            visible_from,
            visible_to,
        } => set_element_visibility(template, element_id, visible_from, visible_to),
    }
}

fn add_section(
    template: &mut Template,
    section: Section,
    index: Option<usize>,
) -> Result<EditorCommand, TemplateError> {
    if template.section_index(section.id).is_some() {
        return Err(TemplateError::SectionExists(section.id));
    }
    validate_duration(section.duration)?;
    for (idx, element) in section.elements.iter().enumerate() {
        element.validate()?;
        let repeated = section.elements[..idx].iter().any(|e| e.id == element.id);
        if repeated || template.find_element(element.id).is_some() {
            return Err(TemplateError::ElementExists(element.id));
        }
    }
    let idx = index.unwrap_or(template.sections.len());
    if idx > template.sections.len() {
        return Err(TemplateError::InvalidOp(format!(
            "section index {} out of bounds for {} sections",
            idx,
            template.sections.len()
        )));
    }

    let section_id = section.id;
    template.sections.insert(idx, section);
    template.reflow();
    Ok(EditorCommand::RemoveSection { section_id })
}

fn remove_section(
    template: &mut Template,
    section_id: SectionId,
) -> Result<EditorCommand, TemplateError> {
    let idx = template
        .section_index(section_id)
        .ok_or(TemplateError::SectionNotFound(section_id))?;
    let section = template.sections.remove(idx);
    template.reflow();
    Ok(EditorCommand::AddSection {
        section,
        index: Some(idx),
    })
}

fn move_section(
    template: &mut Template,
    section_id: SectionId,
    index: usize,
) -> Result<EditorCommand, TemplateError> {
    let current = template
        .section_index(section_id)
        .ok_or(TemplateError::SectionNotFound(section_id))?;
    let section = template.sections.remove(current);
    let target = std::cmp::min(index, template.sections.len());
    template.sections.insert(target, section);
    template.reflow();
    Ok(EditorCommand::MoveSection {
        section_id,
        index: current,
    })
}

fn resize_section(
    template: &mut Template,
    section_id: SectionId,
    duration: Seconds,
) -> Result<EditorCommand, TemplateError> {
    validate_duration(duration)?;
    let section = template
        .section_mut(section_id)
        .ok_or(TemplateError::SectionNotFound(section_id))?;
    let previous = std::mem::replace(&mut section.duration, duration);
    template.reflow();
    Ok(EditorCommand::ResizeSection {
        section_id,
        duration: previous,
    })
}

fn rename_section(
    template: &mut Template,
    section_id: SectionId,
    label: Option<String>,
) -> Result<EditorCommand, TemplateError> {
    let section = template
        .section_mut(section_id)
        .ok_or(TemplateError::SectionNotFound(section_id))?;
    let previous = std::mem::replace(&mut section.label, label);
    Ok(EditorCommand::RenameSection {
        section_id,
        label: previous,
    })
}

fn add_element(
    template: &mut Template,
    section_id: SectionId,
    element: Element,
    index: Option<usize>,
) -> Result<EditorCommand, TemplateError> {
    if template.find_element(element.id).is_some() {
        return Err(TemplateError::ElementExists(element.id));
    }
    element.validate()?;
    let section = template
        .section_mut(section_id)
        .ok_or(TemplateError::SectionNotFound(section_id))?;
    let idx = index.unwrap_or(section.elements.len());
    if idx > section.elements.len() {
        return Err(TemplateError::InvalidOp(format!(
            "element index {} out of bounds for section {}",
            idx, section_id
        )));
    }

    let element_id = element.id;
    section.elements.insert(idx, element);
    Ok(EditorCommand::RemoveElement { element_id })
}

fn remove_element(
    template: &mut Template,
    element_id: ElementId,
) -> Result<EditorCommand, TemplateError> {
    for section in template.sections.iter_mut() {
        if let Some(idx) = section.elements.iter().position(|e| e.id == element_id) {
            let element = section.elements.remove(idx);
            return Ok(EditorCommand::AddElement {
                section_id: section.id,
                element,
                index: Some(idx),
            });
        }
    }
    Err(TemplateError::ElementNotFound(element_id))
}

fn element_mut(
    template: &mut Template,
    element_id: ElementId,
) -> Result<&mut Element, TemplateError> {
    template
        .find_element_mut(element_id)
        .ok_or(TemplateError::ElementNotFound(element_id))
}

fn move_element(
    template: &mut Template,
    element_id: ElementId,
    position: Position,
) -> Result<EditorCommand, TemplateError> {
    if !position.x.is_finite() || !position.y.is_finite() {
        return Err(TemplateError::InvalidPointer(position.x, position.y));
    }
    let element = element_mut(template, element_id)?;
    let previous = std::mem::replace(&mut element.position, position);
    Ok(EditorCommand::MoveElement {
        element_id,
        position: previous,
    })
}

fn resize_element(
    template: &mut Template,
    element_id: ElementId,
    size: Size,
) -> Result<EditorCommand, TemplateError> {
    size.validate()?;
    let element = element_mut(template, element_id)?;
    let previous = std::mem::replace(&mut element.size, size);
    Ok(EditorCommand::ResizeElement {
        element_id,
        size: previous,
    })
}

fn set_element_style(
    template: &mut Template,
    element_id: ElementId,
    style: serde_json::Value,
) -> Result<EditorCommand, TemplateError> {
    let element = element_mut(template, element_id)?;
    let previous = std::mem::replace(&mut element.style, style);
    Ok(EditorCommand::SetElementStyle {
        element_id,
        style: previous,
    })
}

fn set_element_visibility(
    template: &mut Template,
    element_id: ElementId,
    visible_from: Option<Seconds>,
    visible_to: Option<Seconds>,
) -> Result<EditorCommand, TemplateError> {
    validate_visibility(visible_from, visible_to)?;
    let element = element_mut(template, element_id)?;
    let previous_from = std::mem::replace(&mut element.visible_from, visible_from);
    let previous_to = std::mem::replace(&mut element.visible_to, visible_to);
    Ok(EditorCommand::SetElementVisibility {
        element_id,
        visible_from: previous_from,
        visible_to: previous_to,
    })
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CommandHistory {
    undo_stack: Vec<EditorCommand>,
    redo_stack: Vec<EditorCommand>,
}

impl CommandHistory {
    pub fn apply(
        &mut self,
        template: &mut Template,
        command: EditorCommand,
    ) -> Result<(), TemplateError> {
        let inverse = apply_command(template, command)?;
        self.undo_stack.push(inverse);
        self.redo_stack.clear();
        Ok(())
    }

    pub fn undo(&mut self, template: &mut Template) -> Result<(), TemplateError> {
        let command = self
            .undo_stack
            .pop()
            .ok_or(TemplateError::HistoryEmpty("undo stack"))?;
        let inverse = apply_command(template, command)?;
        self.redo_stack.push(inverse);
        Ok(())
    }

    pub fn redo(&mut self, template: &mut Template) -> Result<(), TemplateError> {
        let command = self
            .redo_stack
            .pop()
            .ok_or(TemplateError::HistoryEmpty("redo stack"))?;
        let inverse = apply_command(template, command)?;
        self.undo_stack.push(inverse);
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
