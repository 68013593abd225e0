//! Border-number editing on a stored element sequence.
//!
//! The editor never touches the store. Each operation works on a copy of the
//! stored rows and returns the [`SequenceEdit`] batch that turns the stored
//! sequence into the edited one. Only rows whose element changed are
//! re-rendered; rows keep their id unless they are newly inserted.
//!
//! After every operation the markers after the anchor are numbered
//! contiguously. Adding continues from the highest number before the anchor;
//! removing or joining shifts the following markers down into the freed slot.

use docunit_elements::{BorderNumberElement, DocumentElement, HtmlRenderer, ParagraphElement};
use docunit_store::{ConvertedElement, ElementDraft, SequenceEdit};
use uuid::Uuid;

use crate::error::EditTargetError;

/// Plans border-number edits.
#[derive(Debug, Clone, Copy, Default)]
pub struct BorderNumberEditor {
    renderer: HtmlRenderer,
}

impl BorderNumberEditor {
    #[must_use]
    pub fn new(renderer: HtmlRenderer) -> Self {
        Self { renderer }
    }

    /// Promote the run of paragraphs starting at `start` into border numbers.
    ///
    /// Blank paragraphs inside the run stay plain paragraphs. The run ends at
    /// the first element that is not a paragraph. A border number at `start`
    /// means the run was already promoted and nothing changes.
    ///
    /// # Errors
    ///
    /// Returns [`EditTargetError`] when `start` is unknown or is neither a
    /// paragraph nor a border number.
    pub fn add_border_numbers(
        &self,
        rows: &[ConvertedElement],
        start: Uuid,
    ) -> Result<Vec<SequenceEdit>, EditTargetError> {
        let mut copy = WorkingCopy::new(rows, &self.renderer);
        let pos = copy.position(start)?;
        match copy.element(pos) {
            DocumentElement::BorderNumber(_) => return Ok(Vec::new()),
            DocumentElement::Paragraph(_) => {}
            other => return Err(ineligible(start, other)),
        }

        let base = copy.highest_before(pos);
        let mut i = pos;
        while let Some(DocumentElement::Paragraph(p)) = copy.get(i) {
            if !p.is_blank() {
                let marker = BorderNumberElement {
                    number: String::new(),
                    children: vec![DocumentElement::Paragraph(p.clone())],
                };
                copy.set(i, marker.into());
            }
            i += 1;
        }
        copy.renumber_from(pos, base + 1);

        Ok(copy.finish())
    }

    /// Demote every border number at or after `start` (or from the first row).
    ///
    /// # Errors
    ///
    /// Returns [`EditTargetError::UnknownElement`] when `start` is unknown.
    pub fn remove_border_numbers(
        &self,
        rows: &[ConvertedElement],
        start: Option<Uuid>,
    ) -> Result<Vec<SequenceEdit>, EditTargetError> {
        let mut copy = WorkingCopy::new(rows, &self.renderer);
        let mut i = match start {
            Some(id) => copy.position(id)?,
            None => 0,
        };

        while i < copy.len() {
            i = if copy.element(i).is_border_number() {
                copy.demote(i)
            } else {
                i + 1
            };
        }

        Ok(copy.finish())
    }

    /// Demote the border number at `start` and close the numbering gap.
    ///
    /// The markers after it move down one slot: the first takes the removed
    /// marker's numeric value, or the highest number before it plus one
    /// when the removed number has no digits.
    ///
    /// A paragraph at `start` means the marker was already demoted and
    /// nothing changes.
    ///
    /// # Errors
    ///
    /// Returns [`EditTargetError`] when `start` is unknown or is neither a
    /// border number nor a paragraph.
    pub fn remove_border_number(
        &self,
        rows: &[ConvertedElement],
        start: Uuid,
    ) -> Result<Vec<SequenceEdit>, EditTargetError> {
        let mut copy = WorkingCopy::new(rows, &self.renderer);
        let pos = copy.position(start)?;
        let removed = match copy.element(pos) {
            DocumentElement::Paragraph(_) => return Ok(Vec::new()),
            DocumentElement::BorderNumber(b) => b.numeric_value(),
            other => return Err(ineligible(start, other)),
        };

        let first = removed.unwrap_or_else(|| copy.highest_before(pos) + 1);
        let next = copy.demote(pos);
        copy.renumber_from(next, first);

        Ok(copy.finish())
    }

    /// Merge the border number at `start` into the nearest preceding one.
    ///
    /// The predecessor absorbs every row between the two plus the target's
    /// own content; the target row disappears and the markers after it take
    /// over its numbering slot.
    ///
    /// # Errors
    ///
    /// Returns [`EditTargetError`] when `start` is unknown, is not a border
    /// number, or has no preceding border number.
    pub fn join_border_numbers(
        &self,
        rows: &[ConvertedElement],
        start: Uuid,
    ) -> Result<Vec<SequenceEdit>, EditTargetError> {
        let mut copy = WorkingCopy::new(rows, &self.renderer);
        let pos = copy.position(start)?;
        let target = match copy.element(pos) {
            DocumentElement::BorderNumber(b) => b.clone(),
            other => return Err(ineligible(start, other)),
        };
        let (pred, mut merged) = copy
            .marker_before(pos)
            .ok_or(EditTargetError::NoPredecessor(start))?;
        let first = target
            .numeric_value()
            .unwrap_or_else(|| copy.highest_before(pos) + 1);

        merged
            .children
            .extend((pred + 1..pos).map(|i| copy.element(i).clone()));
        merged.children.extend(target.children);
        copy.set(pred, merged.into());
        for _ in pred + 1..=pos {
            copy.remove(pred + 1);
        }

        copy.renumber_from(pred + 1, first);

        Ok(copy.finish())
    }
}

fn ineligible(id: Uuid, element: &DocumentElement) -> EditTargetError {
    EditTargetError::Ineligible {
        id,
        kind: element.kind(),
    }
}

struct Row {
    id: Uuid,
    element: DocumentElement,
    dirty: bool,
}

/// Mutable copy of a sequence that records the edits applied to it.
///
/// Inserts and removals are recorded as they happen. Replacements are
/// deferred to [`finish`](Self::finish) so each changed row is rendered once
/// at its final position.
struct WorkingCopy<'r> {
    rows: Vec<Row>,
    edits: Vec<SequenceEdit>,
    renderer: &'r HtmlRenderer,
}

impl<'r> WorkingCopy<'r> {
    fn new(rows: &[ConvertedElement], renderer: &'r HtmlRenderer) -> Self {
        Self {
            rows: rows
                .iter()
                .map(|row| Row {
                    id: row.id,
                    element: row.element.clone(),
                    dirty: false,
                })
                .collect(),
            edits: Vec::new(),
            renderer,
        }
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn position(&self, id: Uuid) -> Result<usize, EditTargetError> {
        self.rows
            .iter()
            .position(|row| row.id == id)
            .ok_or(EditTargetError::UnknownElement(id))
    }

    fn get(&self, pos: usize) -> Option<&DocumentElement> {
        self.rows.get(pos).map(|row| &row.element)
    }

    fn element(&self, pos: usize) -> &DocumentElement {
        &self.rows[pos].element
    }

    /// Highest border-number value before `pos`, 0 when there is none.
    fn highest_before(&self, pos: usize) -> u32 {
        self.rows[..pos]
            .iter()
            .filter_map(|row| row.element.as_border_number())
            .filter_map(BorderNumberElement::numeric_value)
            .max()
            .unwrap_or(0)
    }

    fn marker_before(&self, pos: usize) -> Option<(usize, BorderNumberElement)> {
        self.rows[..pos]
            .iter()
            .enumerate()
            .rev()
            .find_map(|(i, row)| row.element.as_border_number().map(|b| (i, b.clone())))
    }

    fn set(&mut self, pos: usize, element: DocumentElement) {
        let row = &mut self.rows[pos];
        if row.element != element {
            row.element = element;
            row.dirty = true;
        }
    }

    fn insert(&mut self, pos: usize, element: DocumentElement) {
        let id = Uuid::new_v4();
        let row = self.draft(id, element.clone());
        self.edits.push(SequenceEdit::Insert { position: pos, row });
        self.rows.insert(
            pos,
            Row {
                id,
                element,
                dirty: false,
            },
        );
    }

    fn remove(&mut self, pos: usize) {
        self.rows.remove(pos);
        self.edits.push(SequenceEdit::Remove { position: pos });
    }

    /// Replace the marker at `pos` by its content and return the position
    /// after the rows that took its place.
    ///
    /// The first content element keeps the marker's id; a marker without
    /// content becomes an empty paragraph.
    fn demote(&mut self, pos: usize) -> usize {
        let children = match self.element(pos) {
            DocumentElement::BorderNumber(b) => b.children.clone(),
            _ => return pos + 1,
        };
        let mut children = children.into_iter();
        let first = children
            .next()
            .unwrap_or_else(|| ParagraphElement::default().into());
        self.set(pos, first);

        let mut at = pos + 1;
        for child in children {
            self.insert(at, child);
            at += 1;
        }
        at
    }

    /// Number the markers from `pos` onward as `next`, `next + 1`, ...
    fn renumber_from(&mut self, pos: usize, mut next: u32) {
        for i in pos..self.rows.len() {
            let Some(marker) = self.rows[i].element.as_border_number() else {
                continue;
            };
            let number = next.to_string();
            if marker.number != number {
                let mut marker = marker.clone();
                marker.number = number;
                self.set(i, marker.into());
            }
            next += 1;
        }
    }

    fn draft(&self, id: Uuid, element: DocumentElement) -> ElementDraft {
        let content = self
            .renderer
            .render_with_id(&element, Some(&id.to_string()));
        ElementDraft {
            id,
            content,
            element,
        }
    }

    fn finish(mut self) -> Vec<SequenceEdit> {
        let mut edits = std::mem::take(&mut self.edits);
        for (position, row) in self.rows.iter().enumerate() {
            if row.dirty {
                edits.push(SequenceEdit::Replace {
                    position,
                    row: self.draft(row.id, row.element.clone()),
                });
            }
        }
        edits
    }
}
