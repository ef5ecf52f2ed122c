//! QRコードシートのPDF描画
//!
//! QrSheetLayoutの配置に従い、QRコードをベクター（塗りつぶし矩形）で描画する。
//! ロゴ画像が読み込めればQRコード中央に重ね、細い枠線で囲む。

use printpdf::image_crate::{DynamicImage, GenericImageView, RgbImage, RgbaImage};
use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Pt, Rect, Rgb,
};
use qrcode::{EcLevel, QrCode};
use thiserror::Error;
use tracing::{info, warn};

use super::qr_config::QrSettings;
use crate::domain::qr_layout::{LABEL_FONT_SIZE, PAGE_HEIGHT_PT, PAGE_WIDTH_PT};
use crate::domain::{QrPlacement, QrSheetLayout};

const DOCUMENT_TITLE: &str = "QR codes";

/// QRコード周囲の余白（モジュール数）
const QR_BORDER_MODULES: usize = 2;

/// ロゴ枠線の太さ（pt）
const LOGO_OUTLINE_THICKNESS: f32 = 0.5;

/// ロゴ画像の解像度（ImageTransformの基準）
const LOGO_DPI: f32 = 300.0;

/// PDF描画のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QrPdfError {
    /// QRコードの生成に失敗（データ量超過など）
    #[error("QRコードの生成に失敗しました: {0}")]
    Encode(String),
    /// PDFの生成に失敗
    #[error("PDFの生成に失敗しました: {0}")]
    Pdf(String),
}

/// シートに並べる1件分
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrSheetItem {
    /// QRコードに埋め込むURL
    pub url: String,
    /// QRコードの下に表示する文字列
    pub label: String,
}

/// QRコードPDFの描画処理
#[derive(Debug, Clone)]
pub struct QrPdfRenderer {
    settings: QrSettings,
}

impl QrPdfRenderer {
    pub fn new(settings: QrSettings) -> Self {
        Self { settings }
    }

    /// QRコードを並べたPDFを生成し、バイト列で返す
    pub fn render(&self, items: &[QrSheetItem]) -> Result<Vec<u8>, QrPdfError> {
        let layout = QrSheetLayout::new(self.settings.cols_per_row());
        let placements = layout.placements(items.len());

        let (doc, first_page, first_layer) =
            PdfDocument::new(DOCUMENT_TITLE, page_width(), page_height(), "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| QrPdfError::Pdf(e.to_string()))?;
        let logo = self.load_logo();

        let mut layers = vec![doc.get_page(first_page).get_layer(first_layer)];

        for (item, placement) in items.iter().zip(&placements) {
            while layers.len() <= placement.page {
                layers.push(add_page(&doc, layers.len() + 1));
            }
            let layer = &layers[placement.page];

            draw_qr_code(layer, &item.url, placement)?;
            if let Some(logo) = &logo {
                self.draw_logo(layer, logo, placement);
            }
            draw_label(layer, &font, &item.label, placement);
        }

        let bytes = doc
            .save_to_bytes()
            .map_err(|e| QrPdfError::Pdf(e.to_string()))?;

        info!(
            items = items.len(),
            pages = layers.len(),
            size = bytes.len(),
            "QRコードPDF生成完了"
        );

        Ok(bytes)
    }

    /// ロゴ画像を読み込む（存在しない、読み込めない、または比率が0以下の場合はNone）
    fn load_logo(&self) -> Option<DynamicImage> {
        let path = self.settings.logo_path();
        if self.settings.logo_ratio() <= 0.0 || !path.exists() {
            return None;
        }

        match printpdf::image_crate::open(path) {
            Ok(image) => {
                let rgba = image.to_rgba8();
                if rgba.width() == 0 || rgba.height() == 0 {
                    return None;
                }
                Some(DynamicImage::ImageRgb8(flatten_on_white(&rgba)))
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ロゴ画像を読み込めないためスキップ");
                None
            }
        }
    }

    fn draw_logo(&self, layer: &PdfLayerReference, logo: &DynamicImage, placement: &QrPlacement) {
        let (width_px, height_px) = (logo.width() as f32, logo.height() as f32);
        let logo_box = placement.logo_box(self.settings.logo_ratio(), height_px / width_px);

        // LOGO_DPIでの原寸（pt）に対する倍率
        let natural_width = width_px * 72.0 / LOGO_DPI;
        let natural_height = height_px * 72.0 / LOGO_DPI;

        Image::from_dynamic_image(logo).add_to_layer(
            layer.clone(),
            ImageTransform {
                translate_x: Some(mm(logo_box.x)),
                translate_y: Some(mm(logo_box.y)),
                scale_x: Some(logo_box.width / natural_width),
                scale_y: Some(logo_box.height / natural_height),
                dpi: Some(LOGO_DPI),
                ..Default::default()
            },
        );

        layer.set_outline_color(black());
        layer.set_outline_thickness(LOGO_OUTLINE_THICKNESS);
        layer.add_rect(
            Rect::new(
                mm(logo_box.x),
                mm(logo_box.y),
                mm(logo_box.x + logo_box.width),
                mm(logo_box.y + logo_box.height),
            )
            .with_mode(PaintMode::Stroke),
        );
    }
}

/// 透過部分を白背景に合成する
fn flatten_on_white(image: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        let alpha = u16::from(a);
        let blend = |c: u8| ((u16::from(c) * alpha + 255 * (255 - alpha)) / 255) as u8;
        printpdf::image_crate::Rgb([blend(r), blend(g), blend(b)])
    })
}

fn page_width() -> Mm {
    mm(PAGE_WIDTH_PT)
}

fn page_height() -> Mm {
    mm(PAGE_HEIGHT_PT)
}

fn add_page(doc: &PdfDocumentReference, number: usize) -> PdfLayerReference {
    let (page, layer) = doc.add_page(page_width(), page_height(), format!("Page {}", number));
    doc.get_page(page).get_layer(layer)
}

fn mm(pt: f32) -> Mm {
    Mm::from(Pt(pt))
}

fn black() -> Color {
    Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None))
}

/// 暗モジュールを1つずつ矩形で塗りつぶす
fn draw_qr_code(
    layer: &PdfLayerReference,
    data: &str,
    placement: &QrPlacement,
) -> Result<(), QrPdfError> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::M)
        .map_err(|e| QrPdfError::Encode(e.to_string()))?;
    let width = code.width();
    let colors = code.to_colors();

    let module = placement.size / (width + QR_BORDER_MODULES * 2) as f32;
    let top = placement.y + placement.size;

    layer.set_fill_color(black());
    for (index, color) in colors.iter().enumerate() {
        if *color != qrcode::Color::Dark {
            continue;
        }
        let (col, row) = (index % width, index / width);
        let left = placement.x + (col + QR_BORDER_MODULES) as f32 * module;
        let upper = top - (row + QR_BORDER_MODULES) as f32 * module;

        layer.add_rect(
            Rect::new(mm(left), mm(upper - module), mm(left + module), mm(upper))
                .with_mode(PaintMode::Fill),
        );
    }

    Ok(())
}

fn draw_label(layer: &PdfLayerReference, font: &IndirectFontRef, label: &str, placement: &QrPlacement) {
    let (x, y) = placement.label_origin(label);
    layer.set_fill_color(black());
    layer.use_text(label, LABEL_FONT_SIZE, mm(x), mm(y), font);
}
