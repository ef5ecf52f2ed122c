/// CSVエクスポート用クエリ定義
///
/// 出力設定を持つテーブルは関連テーブルをJOINしてヘッダー設定のカラムを取得する。
/// それ以外のテーブルは`SELECT *`でDBのカラムをそのまま取得する。
///
/// ID指定は`$1`に`bigint[]`をバインドして`= ANY(...)`で絞り込む。
use crate::domain::{RecordSelection, TableName};

/// 実行するクエリとバインドするID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportQuery {
    sql: String,
    record_ids: Option<Vec<i64>>,
}

impl ExportQuery {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// `$1`にバインドするID（全件取得の場合はNone）
    pub fn record_ids(&self) -> Option<&[i64]> {
        self.record_ids.as_deref()
    }
}

/// JOINや値変換が必要なテーブルのクエリ
struct CatalogQuery {
    /// SELECT ... FROM ... JOIN ...
    select: &'static str,
    /// ID絞り込みに使うカラム
    id_column: &'static str,
    /// WHEREの後に付与する句（GROUP BYなど）
    group_by: Option<&'static str>,
}

/// usersはusers_roles経由でrolesと関連し、複数ロールをカンマ区切りで集約する。
/// statusはconfirmed_atが入力されていれば有効。
const USERS_QUERY: CatalogQuery = CatalogQuery {
    select: "SELECT u.id, u.name, u.email, \
             COALESCE(STRING_AGG(r.name, ', ' ORDER BY r.name), '') AS role, \
             CASE WHEN u.confirmed_at IS NOT NULL THEN '有効' ELSE '無効' END AS status, \
             u.updated_at \
             FROM users u \
             LEFT JOIN users_roles ur ON u.id = ur.user_id \
             LEFT JOIN roles r ON ur.role_id = r.id",
    id_column: "u.id",
    group_by: Some("GROUP BY u.id, u.name, u.email, u.confirmed_at, u.updated_at"),
};

const PRODUCTS_QUERY: CatalogQuery = CatalogQuery {
    select: "SELECT c.name AS category_name, p.product_name, p.product_code, \
             m.name AS manufacturer_name, p.updated_at \
             FROM products p \
             LEFT JOIN categories c ON p.category_id = c.id \
             LEFT JOIN manufacturers m ON p.manufacturer_id = m.id",
    id_column: "p.id",
    group_by: None,
};

/// statusは0が有効、1が無効
const CATEGORIES_QUERY: CatalogQuery = CatalogQuery {
    select: "SELECT c.name, c.code, c.label_color, \
             CASE WHEN c.status = 0 THEN '有効' WHEN c.status = 1 THEN '無効' \
             ELSE CAST(c.status AS VARCHAR) END AS status, \
             c.updated_at \
             FROM categories c",
    id_column: "c.id",
    group_by: None,
};

const MANUFACTURERS_QUERY: CatalogQuery = CatalogQuery {
    select: "SELECT m.name, m.code, \
             CASE WHEN m.status = 0 THEN '有効' WHEN m.status = 1 THEN '無効' \
             ELSE CAST(m.status AS VARCHAR) END AS status, \
             m.updated_at \
             FROM manufacturers m",
    id_column: "m.id",
    group_by: None,
};

const SUPPLIES_QUERY: CatalogQuery = CatalogQuery {
    select: "SELECT c.name AS category_name, s.supply_name, s.supply_code, \
             m.name AS manufacturer_name, l.name AS location_name, s.updated_at \
             FROM supplies s \
             LEFT JOIN categories c ON s.category_id = c.id \
             LEFT JOIN manufacturers m ON s.manufacturer_id = m.id \
             LEFT JOIN locations l ON s.location_id = l.id",
    id_column: "s.id",
    group_by: None,
};

fn catalog_query(table: &str) -> Option<&'static CatalogQuery> {
    match table {
        "users" => Some(&USERS_QUERY),
        "products" => Some(&PRODUCTS_QUERY),
        "categories" => Some(&CATEGORIES_QUERY),
        "manufacturers" => Some(&MANUFACTURERS_QUERY),
        "supplies" => Some(&SUPPLIES_QUERY),
        _ => None,
    }
}

/// テーブルと選択条件からクエリを組み立てる
///
/// 選択条件が空のID指定の場合はNone（DBに問い合わせず0件として扱う）。
pub fn build_query(table: &TableName, selection: &RecordSelection) -> Option<ExportQuery> {
    if selection.selects_nothing() {
        return None;
    }

    let (mut sql, id_column, group_by, order_by) = match catalog_query(table.as_str()) {
        Some(query) => (
            query.select.to_string(),
            query.id_column.to_string(),
            query.group_by,
            Some(format!("ORDER BY {}", query.id_column)),
        ),
        None => (format!("SELECT * FROM {}", table), "id".to_string(), None, None),
    };

    let record_ids = match selection {
        RecordSelection::All => None,
        RecordSelection::Ids(ids) => {
            sql.push_str(&format!(" WHERE {} = ANY($1::bigint[])", id_column));
            Some(ids.clone())
        }
    };

    if let Some(group_by) = group_by {
        sql.push(' ');
        sql.push_str(group_by);
    }
    if let Some(order_by) = order_by {
        sql.push(' ');
        sql.push_str(&order_by);
    }

    Some(ExportQuery { sql, record_ids })
}

/// QRコード対象のIDを取得するクエリ
///
/// idの型（integer/bigint）に関わらずbigintで返す。
pub fn build_id_query(table: &TableName, selection: &RecordSelection) -> Option<ExportQuery> {
    if selection.selects_nothing() {
        return None;
    }

    let mut sql = format!("SELECT id::bigint AS id FROM {}", table);
    let record_ids = match selection {
        RecordSelection::All => None,
        RecordSelection::Ids(ids) => {
            sql.push_str(" WHERE id = ANY($1::bigint[])");
            Some(ids.clone())
        }
    };
    sql.push_str(" ORDER BY id");

    Some(ExportQuery { sql, record_ids })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str) -> TableName {
        TableName::parse(name).unwrap()
    }

    #[test]
    fn test_empty_ids_build_no_query() {
        let selection = RecordSelection::Ids(vec![]);
        assert!(build_query(&table("users"), &selection).is_none());
        assert!(build_id_query(&table("users"), &selection).is_none());
    }

    #[test]
    fn test_users_query_with_ids() {
        let query = build_query(&table("users"), &RecordSelection::Ids(vec![1, 2])).unwrap();

        assert!(query.sql().contains("STRING_AGG(r.name"));
        assert!(query.sql().contains("WHERE u.id = ANY($1::bigint[])"));
        // WHERE → GROUP BY → ORDER BY の順
        let where_pos = query.sql().find("WHERE").unwrap();
        let group_pos = query.sql().find("GROUP BY").unwrap();
        let order_pos = query.sql().find("ORDER BY u.id").unwrap();
        assert!(where_pos < group_pos && group_pos < order_pos);
        assert_eq!(query.record_ids(), Some(&[1, 2][..]));
    }

    #[test]
    fn test_users_query_all_records() {
        let query = build_query(&table("users"), &RecordSelection::All).unwrap();

        assert!(!query.sql().contains("WHERE"));
        assert!(query.sql().contains("GROUP BY"));
        assert!(query.record_ids().is_none());
    }

    #[test]
    fn test_supplies_query_joins_locations() {
        let query = build_query(&table("supplies"), &RecordSelection::Ids(vec![3])).unwrap();

        assert!(query.sql().contains("LEFT JOIN locations l ON s.location_id = l.id"));
        assert!(query.sql().ends_with("WHERE s.id = ANY($1::bigint[]) ORDER BY s.id"));
    }

    #[test]
    fn test_categories_status_mapping() {
        let query = build_query(&table("categories"), &RecordSelection::All).unwrap();

        assert!(query.sql().contains("WHEN c.status = 0 THEN '有効'"));
        assert!(query.sql().ends_with("FROM categories c ORDER BY c.id"));
    }

    #[test]
    fn test_unknown_table_falls_back_to_select_all() {
        let query = build_query(&table("locations"), &RecordSelection::Ids(vec![9])).unwrap();

        assert_eq!(
            query.sql(),
            "SELECT * FROM locations WHERE id = ANY($1::bigint[])"
        );
        assert_eq!(query.record_ids(), Some(&[9][..]));
    }

    #[test]
    fn test_id_query() {
        let query = build_id_query(&table("users"), &RecordSelection::Ids(vec![1, 2, 3])).unwrap();
        assert_eq!(
            query.sql(),
            "SELECT id::bigint AS id FROM users WHERE id = ANY($1::bigint[]) ORDER BY id"
        );

        let query = build_id_query(&table("users"), &RecordSelection::All).unwrap();
        assert_eq!(query.sql(), "SELECT id::bigint AS id FROM users ORDER BY id");
        assert!(query.record_ids().is_none());
    }
}
