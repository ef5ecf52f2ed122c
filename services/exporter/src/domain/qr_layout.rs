/// QRコードシートのレイアウト計算
///
/// A4縦のページにQRコードを格子状に並べる。座標はPDFポイント（1/72インチ）で、
/// 原点はページ左下。各セルは上側にQRコード（正方形）、下側にラベル用の余白を持つ。
///
/// ```text
/// +---------------------------------+  <- page_height
/// |  margin                         |
/// |  [QR][QR][QR][QR]               |
/// |  label label label label        |
/// |  [QR][QR] ...                   |
/// ```
///
/// 1行が埋まるごとに行を進め、次の行が下マージンを越える場合は改ページする。

/// A4の幅（pt）
pub const PAGE_WIDTH_PT: f32 = 595.2756;
/// A4の高さ（pt）
pub const PAGE_HEIGHT_PT: f32 = 841.8898;
/// ラベルのフォントサイズ（pt）
pub const LABEL_FONT_SIZE: f32 = 8.0;

const MARGIN_X: f32 = 40.0;
const MARGIN_Y: f32 = 40.0;
const LABEL_HEIGHT: f32 = 16.0;
const LABEL_BASELINE_OFFSET: f32 = 4.0;

const DEFAULT_COLS: usize = 4;
const MIN_COLS: usize = 4;
const MAX_COLS: usize = 8;

/// Helveticaの文字幅（1000単位、ASCII 0x20〜0x7E）
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

/// ASCII外の文字に使う幅
const FALLBACK_WIDTH: u16 = 556;

/// Helvetica で描画した文字列の幅（pt）
pub fn helvetica_text_width(text: &str, font_size: f32) -> f32 {
    let units: u32 = text
        .chars()
        .map(|c| {
            let code = c as u32;
            if (0x20..=0x7E).contains(&code) {
                u32::from(HELVETICA_WIDTHS[(code - 0x20) as usize])
            } else {
                u32::from(FALLBACK_WIDTH)
            }
        })
        .sum();
    units as f32 * font_size / 1000.0
}

/// シート全体のレイアウト
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QrSheetLayout {
    cols: usize,
    cell_width: f32,
    cell_height: f32,
}

impl QrSheetLayout {
    /// 1行あたりの列数を指定してレイアウトを作成
    ///
    /// 列数が4〜8の範囲外の場合は4列にする。
    pub fn new(cols: i64) -> Self {
        let cols = usize::try_from(cols)
            .ok()
            .filter(|cols| (MIN_COLS..=MAX_COLS).contains(cols))
            .unwrap_or(DEFAULT_COLS);
        let cell_width = (PAGE_WIDTH_PT - MARGIN_X * 2.0) / cols as f32;

        Self {
            cols,
            cell_width,
            cell_height: cell_width + LABEL_HEIGHT,
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// QRコード（正方形）の一辺の長さ
    pub fn cell_width(&self) -> f32 {
        self.cell_width
    }

    /// ラベル余白を含むセルの高さ
    pub fn cell_height(&self) -> f32 {
        self.cell_height
    }

    /// `count`個のQRコードの配置を計算
    pub fn placements(&self, count: usize) -> Vec<QrPlacement> {
        let mut placements = Vec::with_capacity(count);
        let mut page = 0;
        let mut col = 0;
        let mut row = 0;

        for _ in 0..count {
            let x = MARGIN_X + col as f32 * self.cell_width;
            let y = PAGE_HEIGHT_PT - MARGIN_Y - (row + 1) as f32 * self.cell_height + LABEL_HEIGHT;
            placements.push(QrPlacement {
                page,
                x,
                y,
                size: self.cell_width,
            });

            col += 1;
            if col >= self.cols {
                col = 0;
                row += 1;
                if MARGIN_Y + (row + 1) as f32 * self.cell_height > PAGE_HEIGHT_PT - MARGIN_Y {
                    page += 1;
                    row = 0;
                }
            }
        }

        placements
    }

    /// `count`個のQRコードに必要なページ数
    pub fn page_count(&self, count: usize) -> usize {
        self.placements(count).last().map_or(0, |p| p.page + 1)
    }
}

/// QRコード1個の配置
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QrPlacement {
    /// ページ番号（0始まり）
    pub page: usize,
    /// QRコード左下のX座標
    pub x: f32,
    /// QRコード左下のY座標
    pub y: f32,
    /// QRコードの一辺
    pub size: f32,
}

impl QrPlacement {
    /// 中央揃えしたラベルの描画開始位置（x, ベースラインy）
    pub fn label_origin(&self, label: &str) -> (f32, f32) {
        let width = helvetica_text_width(label, LABEL_FONT_SIZE);
        (
            self.x + self.size / 2.0 - width / 2.0,
            self.y - LABEL_BASELINE_OFFSET,
        )
    }

    /// QRコード中央に重ねるロゴの配置
    ///
    /// # 引数
    /// * `ratio` - QRコードの幅に対するロゴ幅の比率
    /// * `aspect` - ロゴ画像の高さ/幅
    pub fn logo_box(&self, ratio: f32, aspect: f32) -> LogoBox {
        let width = self.size * ratio;
        let height = width * aspect;
        LogoBox {
            x: self.x + (self.size - width) / 2.0,
            y: self.y + (self.size - height) / 2.0,
            width,
            height,
        }
    }
}

/// ロゴ画像の配置（左下座標とサイズ）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogoBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn test_new_clamps_invalid_cols() {
        assert_eq!(QrSheetLayout::new(3).cols(), 4);
        assert_eq!(QrSheetLayout::new(9).cols(), 4);
        assert_eq!(QrSheetLayout::new(0).cols(), 4);
        assert_eq!(QrSheetLayout::new(-1).cols(), 4);
        assert_eq!(QrSheetLayout::new(6).cols(), 6);
        assert_eq!(QrSheetLayout::new(8).cols(), 8);
    }

    #[test]
    fn test_cell_size() {
        let layout = QrSheetLayout::new(4);
        assert!(approx_eq(layout.cell_width(), 128.8189));
        assert!(approx_eq(layout.cell_height(), 144.8189));
    }

    #[test]
    fn test_first_placement_is_top_left() {
        let layout = QrSheetLayout::new(4);
        let placements = layout.placements(1);

        assert_eq!(placements.len(), 1);
        assert_eq!(placements[0].page, 0);
        assert!(approx_eq(placements[0].x, 40.0));
        assert!(approx_eq(placements[0].y, 673.0709));
    }

    #[test]
    fn test_row_wraps_after_cols() {
        let layout = QrSheetLayout::new(4);
        let placements = layout.placements(5);

        assert!(approx_eq(placements[3].x, 40.0 + 3.0 * layout.cell_width()));
        assert!(approx_eq(placements[4].x, 40.0));
        assert!(approx_eq(
            placements[4].y,
            placements[0].y - layout.cell_height()
        ));
    }

    #[test]
    fn test_page_break_four_cols() {
        let layout = QrSheetLayout::new(4);

        // 4列 x 5行 = 20個で1ページ
        assert_eq!(layout.page_count(20), 1);
        assert_eq!(layout.page_count(21), 2);

        let placements = layout.placements(21);
        assert_eq!(placements[19].page, 0);
        assert_eq!(placements[20].page, 1);
        assert!(approx_eq(placements[20].y, placements[0].y));
        assert!(approx_eq(placements[20].x, 40.0));
    }

    #[test]
    fn test_page_break_eight_cols() {
        let layout = QrSheetLayout::new(8);

        // 8列 x 9行 = 72個で1ページ
        assert_eq!(layout.page_count(72), 1);
        assert_eq!(layout.page_count(73), 2);
    }

    #[test]
    fn test_no_placement_crosses_bottom_margin() {
        for cols in 4..=8 {
            let layout = QrSheetLayout::new(cols);
            for placement in layout.placements(200) {
                // ラベル余白を含めてもマージン内に収まる
                assert!(placement.y - LABEL_HEIGHT >= MARGIN_Y - 0.01);
            }
        }
    }

    #[test]
    fn test_zero_items_need_no_page() {
        assert_eq!(QrSheetLayout::new(4).page_count(0), 0);
    }

    #[test]
    fn test_helvetica_text_width() {
        assert!(approx_eq(helvetica_text_width("11", 8.0), 8.896));
        assert!(approx_eq(helvetica_text_width("/quick_access/1", 8.0), 56.912));
        assert!(approx_eq(helvetica_text_width("", 8.0), 0.0));
    }

    #[test]
    fn test_label_origin_is_centered() {
        let placement = QrPlacement {
            page: 0,
            x: 40.0,
            y: 100.0,
            size: 100.0,
        };
        let (x, y) = placement.label_origin("11");

        assert!(approx_eq(x, 90.0 - 4.448));
        assert!(approx_eq(y, 96.0));
    }

    #[test]
    fn test_logo_box_is_centered() {
        let placement = QrPlacement {
            page: 0,
            x: 0.0,
            y: 0.0,
            size: 100.0,
        };
        let logo = placement.logo_box(0.25, 0.5);

        assert!(approx_eq(logo.width, 25.0));
        assert!(approx_eq(logo.height, 12.5));
        assert!(approx_eq(logo.x, 37.5));
        assert!(approx_eq(logo.y, 43.75));
    }
}
