//! PDF serialization of laid-out pages.

use super::compositing::PreparedImage;
use super::layout::{Block, Face, PageLayout, PAGE_HEIGHT, PAGE_WIDTH};
use crate::errors::DocumentError;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

const BACKGROUND_NAME: &str = "Bg";
const INLINE_NAME: &str = "Im1";

/// Everything the writer needs besides the layout.
#[derive(Debug, Default)]
pub struct PdfSources {
    /// Document title for the info dictionary.
    pub title: String,
    /// Full-page background drawn under every page.
    pub background: Option<PreparedImage>,
    /// Image referenced by [`Block::Image`].
    pub inline: Option<PreparedImage>,
}

/// Encodes `text` as WinAnsi for the standard Type1 fonts. Characters
/// outside the encoding become `?`.
#[must_use]
pub fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            c if (' '..='~').contains(&c) => c as u8,
            #[allow(clippy::cast_possible_truncation)]
            c if ('\u{A0}'..='\u{FF}').contains(&c) => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

fn add_image(doc: &mut Document, image: &PreparedImage) -> ObjectId {
    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(image.width),
        "Height" => i64::from(image.height),
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
    };
    if let Some(alpha) = &image.alpha {
        let mask_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(image.width),
                "Height" => i64::from(image.height),
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            alpha.clone(),
        ));
        dict.set("SMask", mask_id);
    }
    doc.add_object(Stream::new(dict, image.rgb.clone()))
}

fn draw_image(ops: &mut Vec<Operation>, name: &str, x: f32, y: f32, width: f32, height: f32) {
    ops.push(Operation::new("q", vec![]));
    ops.push(Operation::new(
        "cm",
        vec![width.into(), 0.into(), 0.into(), height.into(), x.into(), y.into()],
    ));
    ops.push(Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]));
    ops.push(Operation::new("Q", vec![]));
}

fn page_operations(page: &PageLayout, has_background: bool, has_inline: bool) -> Vec<Operation> {
    let mut ops = Vec::new();
    if has_background {
        draw_image(&mut ops, BACKGROUND_NAME, 0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT);
    }

    for block in &page.blocks {
        match block {
            Block::Text {
                x,
                y,
                size,
                face,
                text,
            } => {
                let font = match face {
                    Face::Regular => "F1",
                    Face::Bold => "F2",
                };
                ops.push(Operation::new("BT", vec![]));
                ops.push(Operation::new(
                    "Tf",
                    vec![Object::Name(font.as_bytes().to_vec()), (*size).into()],
                ));
                ops.push(Operation::new("Td", vec![(*x).into(), (*y).into()]));
                ops.push(Operation::new("Tj", vec![Object::string_literal(win_ansi(text))]));
                ops.push(Operation::new("ET", vec![]));
            }
            Block::Image {
                x,
                y,
                width,
                height,
            } if has_inline => draw_image(&mut ops, INLINE_NAME, *x, *y, *width, *height),
            Block::Image { .. } => {}
        }
    }
    ops
}

/// Writes `pages` as a compressed PDF.
pub fn write(pages: &[PageLayout], sources: &PdfSources) -> Result<Vec<u8>, DocumentError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut xobjects = lopdf::Dictionary::new();
    if let Some(background) = &sources.background {
        xobjects.set(BACKGROUND_NAME, add_image(&mut doc, background));
    }
    if let Some(inline) = &sources.inline {
        xobjects.set(INLINE_NAME, add_image(&mut doc, inline));
    }

    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
        "XObject" => xobjects,
    });

    let mut kids = Vec::with_capacity(pages.len());
    for page in pages {
        let content = Content {
            operations: page_operations(page, sources.background.is_some(), sources.inline.is_some()),
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = i64::try_from(kids.len()).map_err(|e| DocumentError::Pdf(e.to_string()))?;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(win_ansi(&sources.title)),
        "Producer" => Object::string_literal("herostory"),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.compress();

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| DocumentError::Pdf(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_line_page() -> PageLayout {
        PageLayout {
            blocks: vec![Block::Text {
                x: 56.0,
                y: 700.0,
                size: 11.0,
                face: Face::Regular,
                text: "Once upon a time".to_string(),
            }],
        }
    }

    fn pixel() -> PreparedImage {
        PreparedImage {
            width: 1,
            height: 1,
            rgb: vec![255, 0, 0],
            alpha: Some(vec![26]),
        }
    }

    #[test]
    fn test_win_ansi() {
        assert_eq!(win_ansi("Ren’s “quest” — café"), b"Ren\x92s \x93quest\x94 \x97 caf\xe9".to_vec());
        assert_eq!(win_ansi("雪"), b"?".to_vec());
    }

    #[test]
    fn test_write_produces_loadable_pdf() {
        let pages = vec![one_line_page(), one_line_page()];
        let bytes = write(&pages, &PdfSources::default()).unwrap();

        assert!(bytes.starts_with(b"%PDF-1.5"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn test_background_and_mask_are_embedded() {
        let sources = PdfSources {
            title: "Ren".to_string(),
            background: Some(pixel()),
            inline: None,
        };
        let bytes = write(&[one_line_page()], &sources).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();

        let images = doc
            .objects
            .values()
            .filter_map(|o| o.as_stream().ok())
            .filter(|s| {
                s.dict
                    .get(b"Subtype")
                    .and_then(Object::as_name)
                    .map(|n| n == b"Image")
                    .unwrap_or(false)
            })
            .count();
        assert_eq!(images, 2);
    }
}
