/// テーブルごとのCSV出力設定
///
/// `field_order`で出力するカラムと順序を、`labels`でカラム名からヘッダー名への
/// 対応を定義する。設定のないテーブルはDBのカラム名をそのままヘッダーに使う。

/// 1テーブル分のCSV出力設定
#[derive(Debug, PartialEq, Eq)]
pub struct TableExportConfig {
    field_order: &'static [&'static str],
    labels: &'static [(&'static str, &'static str)],
}

/// 出力設定を持つテーブルの一覧
///
/// テーブルを追加する場合はここに追記する。
static CATALOG: &[(&str, TableExportConfig)] = &[
    (
        "users",
        TableExportConfig {
            field_order: &["name", "email", "role", "status", "updated_at"],
            labels: &[
                ("name", "アカウント名"),
                ("email", "メールアドレス"),
                ("role", "ロール"),
                ("status", "ステータス"),
                ("updated_at", "更新日時"),
            ],
        },
    ),
    (
        "products",
        TableExportConfig {
            field_order: &[
                "category_name",
                "product_name",
                "product_code",
                "manufacturer_name",
                "updated_at",
            ],
            labels: &[
                ("category_name", "カテゴリ"),
                ("product_name", "品名"),
                ("product_code", "品番"),
                ("manufacturer_name", "メーカー"),
                ("updated_at", "更新日時"),
            ],
        },
    ),
    (
        "categories",
        TableExportConfig {
            field_order: &["name", "code", "label_color", "status", "updated_at"],
            labels: &[
                ("name", "カテゴリ名"),
                ("code", "コード"),
                ("label_color", "ラベル色"),
                ("status", "ステータス"),
                ("updated_at", "更新日時"),
            ],
        },
    ),
    (
        "manufacturers",
        TableExportConfig {
            field_order: &["name", "code", "status", "updated_at"],
            labels: &[
                ("name", "メーカー名"),
                ("code", "コード"),
                ("status", "ステータス"),
                ("updated_at", "更新日時"),
            ],
        },
    ),
    (
        "locations",
        TableExportConfig {
            field_order: &["name", "code", "status", "updated_at"],
            labels: &[
                ("name", "保管場所名"),
                ("code", "コード"),
                ("status", "ステータス"),
                ("updated_at", "更新日時"),
            ],
        },
    ),
    (
        "supplies",
        TableExportConfig {
            field_order: &[
                "category_name",
                "supply_name",
                "supply_code",
                "manufacturer_name",
                "location_name",
                "updated_at",
            ],
            labels: &[
                ("category_name", "カテゴリ"),
                ("supply_name", "品名"),
                ("supply_code", "品番"),
                ("manufacturer_name", "メーカー"),
                ("location_name", "保管場所"),
                ("updated_at", "更新日時"),
            ],
        },
    ),
];

impl TableExportConfig {
    /// テーブル名から出力設定を取得（未設定の場合はNone）
    pub fn for_table(table: &str) -> Option<&'static TableExportConfig> {
        CATALOG
            .iter()
            .find(|(name, _)| *name == table)
            .map(|(_, config)| config)
    }

    /// 出力するカラムと順序（空の場合は取得結果のカラム順）
    pub fn field_order(&self) -> &[&'static str] {
        self.field_order
    }

    /// カラム名に対応するヘッダー名（未定義の場合はカラム名）
    pub fn label<'a>(&'a self, field: &'a str) -> &'a str {
        self.labels
            .iter()
            .find(|(name, _)| *name == field)
            .map_or(field, |(_, label)| *label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_table_known() {
        let config = TableExportConfig::for_table("users").unwrap();
        assert_eq!(
            config.field_order(),
            &["name", "email", "role", "status", "updated_at"]
        );
        assert_eq!(config.label("email"), "メールアドレス");
    }

    #[test]
    fn test_for_table_unknown() {
        assert!(TableExportConfig::for_table("exported_files").is_none());
    }

    #[test]
    fn test_label_falls_back_to_field_name() {
        let config = TableExportConfig::for_table("locations").unwrap();
        assert_eq!(config.label("id"), "id");
    }

    #[test]
    fn test_every_field_has_label() {
        for (table, config) in CATALOG {
            for field in config.field_order() {
                assert_ne!(
                    config.label(field),
                    *field,
                    "{}.{} にラベルが定義されていない",
                    table,
                    field
                );
            }
        }
    }
}
