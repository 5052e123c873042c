//! Note document model and JSON persistence.
//!
//! A note is a sequence of pages, each holding committed strokes. The disk
//! format is compact JSON: `{"w": width, "c": "#rrggbb", "e": is_eraser,
//! "pts": [[x, y], ...]}` per stroke, grouped by page.

use crate::stroke::{Rgba8, Stroke};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

/// Errors from note persistence.
#[derive(Debug, Error)]
pub enum NoteError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed note: {0}")]
    Json(#[from] serde_json::Error),
}

/// One page of a note.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotePage {
    pub title: String,
    pub strokes: Vec<Stroke>,
}

/// A note document: identity, title, pages.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub pages: Vec<NotePage>,
}

impl Note {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            pages: vec![NotePage {
                title: "Page 1".to_string(),
                strokes: Vec::new(),
            }],
        }
    }

    /// Grow the page list so `index` is valid, naming new pages
    /// "Page 2", "Page 3", ...
    pub fn ensure_page(&mut self, index: usize) {
        while self.pages.len() <= index {
            let title = format!("Page {}", self.pages.len() + 1);
            self.pages.push(NotePage {
                title,
                strokes: Vec::new(),
            });
        }
    }

    /// Append a committed stroke to the page it names.
    pub fn add_stroke(&mut self, stroke: Stroke) {
        self.ensure_page(stroke.page_index);
        self.pages[stroke.page_index].strokes.push(stroke);
    }

    pub fn stroke_count(&self) -> usize {
        self.pages.iter().map(|page| page.strokes.len()).sum()
    }

    pub fn to_json(&self) -> Result<String, NoteError> {
        Ok(serde_json::to_string(&NoteData::from(self))?)
    }

    pub fn from_json(json: &str) -> Result<Self, NoteError> {
        let data: NoteData = serde_json::from_str(json)?;
        Ok(data.into())
    }

    pub fn save(&self, path: &Path) -> Result<(), NoteError> {
        std::fs::write(path, self.to_json()?)?;
        log::info!("saved note '{}' to {}", self.title, path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, NoteError> {
        let note = Self::from_json(&std::fs::read_to_string(path)?)?;
        log::info!(
            "loaded note '{}' ({} strokes) from {}",
            note.title,
            note.stroke_count(),
            path.display()
        );
        Ok(note)
    }
}

impl Default for Note {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

// Disk representation. Kept separate from the model so the wire format can
// stay compact and stable.

#[derive(Serialize, Deserialize)]
struct StrokeData {
    w: f64,
    c: String,
    #[serde(default)]
    e: bool,
    pts: Vec<[f64; 2]>,
}

#[derive(Serialize, Deserialize)]
struct PageData {
    title: String,
    strokes: Vec<StrokeData>,
}

#[derive(Serialize, Deserialize)]
struct NoteData {
    id: Uuid,
    title: String,
    pages: Vec<PageData>,
}

impl From<&Note> for NoteData {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id,
            title: note.title.clone(),
            pages: note
                .pages
                .iter()
                .map(|page| PageData {
                    title: page.title.clone(),
                    strokes: page
                        .strokes
                        .iter()
                        .map(|stroke| StrokeData {
                            w: stroke.width,
                            c: stroke.color.to_hex(),
                            e: stroke.is_eraser,
                            pts: stroke.points.iter().map(|p| [p.x, p.y]).collect(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

impl From<NoteData> for Note {
    fn from(data: NoteData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            pages: data
                .pages
                .into_iter()
                .enumerate()
                .map(|(page_index, page)| NotePage {
                    title: page.title,
                    strokes: page
                        .strokes
                        .into_iter()
                        .map(|stroke| Stroke {
                            points: stroke.pts.iter().map(|[x, y]| Point::new(*x, *y)).collect(),
                            width: stroke.w,
                            color: Rgba8::from_hex(&stroke.c),
                            is_eraser: stroke.e,
                            page_index,
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}
