/// 経費カテゴリの固定セット
///
/// 保存時のバリデーションと手入力フォームの選択肢の両方で使用されます。
/// サーバー側の自動分類もこのセットのいずれかを返します。
pub const CATEGORIES: &[&str] = &[
    "Food & Dining",
    "Shopping",
    "Transportation",
    "Entertainment",
    "Bills & Utilities",
    "Healthcare",
    "Education",
    "Business Services",
    "Groceries",
    "Miscellaneous",
    "Other",
];

/// すべてのカテゴリ名を取得
pub fn all() -> &'static [&'static str] {
    CATEGORIES
}

/// カテゴリ名が固定セットに含まれるかを判定
///
/// # 引数
/// * `name` - カテゴリ名（前後の空白は無視）
pub fn is_known(name: &str) -> bool {
    let trimmed = name.trim();
    CATEGORIES.iter().any(|c| *c == trimmed)
}
