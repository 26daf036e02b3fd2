//! Renders job-description text into a PDF using the standard Helvetica font.
//!
//! No fonts are embedded; the output relies on the PDF core-14 fonts with
//! WinAnsi encoding, so characters outside that set are written as `?`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use tracing::info;

use crate::document::font_metrics::{win_ansi_byte, PageLayout, HELVETICA};
use crate::errors::AppError;

/// Builds the PDF in memory. Text that overflows a page continues on the next.
pub fn build_document(text: &str, layout: &PageLayout) -> Result<Document> {
    let lines = HELVETICA.wrap(text, layout);
    let per_page = layout.lines_per_page();

    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for chunk in lines.chunks(per_page.max(1)) {
        let page_id = add_page(&mut doc, pages_id, resources_id, chunk, layout)?;
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_count,
        "Resources" => resources_id,
        "MediaBox" => vec![
            0.into(),
            0.into(),
            pt(layout.page_width_pt).into(),
            pt(layout.page_height_pt).into(),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal("Job Description"),
        "Producer" => Object::string_literal(concat!("screener ", env!("CARGO_PKG_VERSION"))),
        "CreationDate" => Object::string_literal(
            chrono::Utc::now().format("D:%Y%m%d%H%M%SZ").to_string()
        ),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.compress();

    Ok(doc)
}

fn add_page(
    doc: &mut Document,
    pages_id: ObjectId,
    resources_id: ObjectId,
    lines: &[String],
    layout: &PageLayout,
) -> Result<ObjectId> {
    let top_baseline = layout.page_height_pt - layout.margin_pt - layout.font_size_pt;

    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), pt(layout.font_size_pt).into()]),
        Operation::new("TL", vec![pt(layout.leading_pt).into()]),
        Operation::new(
            "Td",
            vec![pt(layout.margin_pt).into(), pt(top_baseline).into()],
        ),
    ];
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            operations.push(Operation::new("T*", vec![]));
        }
        if !line.is_empty() {
            operations.push(Operation::new(
                "Tj",
                vec![Object::string_literal(encode_win_ansi(line))],
            ));
        }
    }
    operations.push(Operation::new("ET", vec![]));

    let content = Content { operations };
    let encoded = content
        .encode()
        .context("failed to encode page content stream")?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Resources" => resources_id,
        "Contents" => content_id,
    }))
}

fn pt(value: f32) -> i64 {
    value.round() as i64
}

fn encode_win_ansi(line: &str) -> Vec<u8> {
    line.chars()
        .map(|c| win_ansi_byte(c).unwrap_or(b'?'))
        .collect()
}

/// Writes `text` to `path`, replacing any existing document. Blocking.
pub fn write_document(text: &str, path: &Path, layout: &PageLayout) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let mut doc = build_document(text, layout)?;
    doc.save(path)
        .with_context(|| format!("failed to save {}", path.display()))?;
    Ok(path.to_path_buf())
}

/// Renders on the blocking pool and waits for the file to be fully written.
pub async fn render(text: String, path: PathBuf, layout: PageLayout) -> Result<PathBuf, AppError> {
    let written = tokio::task::spawn_blocking(move || write_document(&text, &path, &layout))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in render: {e}")))??;

    info!(path = %written.display(), "Job description document written");
    Ok(written)
}
