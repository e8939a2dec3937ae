/// 日付正規化モジュール
///
/// レシートから抽出された日付や手入力の日付は、欠損・不正形式・時刻付きなど
/// 信頼できない形で渡ってきます。このモジュールはそれらを必ず実在する
/// カレンダー日付（由来情報付き）へ正規化します。
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// 日付の由来
///
/// 値が実際の入力から来たのか、デフォルトポリシーで補われたのかを記録します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateProvenance {
    /// レシート（または明示的なユーザー入力）から取得した日付
    FromReceipt,
    /// 入力が無かったため今日の日付で補完
    DefaultedToday,
    /// 入力が不正だったため今日の日付で補完
    InvalidDefaulted,
}

/// 正規化済みカレンダー日付
///
/// 構築後は不変。`calendar_date`は常に実在する日付です。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalDate {
    /// カレンダー日付（YYYY-MM-DD）
    pub calendar_date: NaiveDate,
    /// ローカル時刻基準で今日かどうか
    pub is_today: bool,
    /// 日付の由来
    pub provenance: DateProvenance,
}

/// 表示用の日付情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateDisplay {
    /// 人間向けの表示文字列（例: "Jan 15, 2024"）
    pub formatted: String,
    /// YYYY-MM-DD形式の生文字列
    pub raw: String,
    /// 説明ノート（"Today" / "From receipt" / "Using current date"）
    pub note: String,
}

impl CanonicalDate {
    /// YYYY-MM-DD形式の文字列を取得
    pub fn as_ymd_string(&self) -> String {
        self.calendar_date.format("%Y-%m-%d").to_string()
    }

    /// デフォルト補完された日付かどうか
    pub fn is_defaulted(&self) -> bool {
        matches!(
            self.provenance,
            DateProvenance::DefaultedToday | DateProvenance::InvalidDefaulted
        )
    }
}

/// ローカルタイムゾーンの今日の日付を取得
///
/// # 注意
/// UTCベースのISO変換は深夜帯に日付がずれるため、必ずローカルの
/// 壁時計の年月日から構築します。
pub fn local_today() -> NaiveDate {
    let now = Local::now();
    // Local::now()の年月日は常に有効なのでこの構築は失敗しない
    NaiveDate::from_ymd_opt(now.year(), now.month(), now.day())
        .unwrap_or_else(|| now.date_naive())
}

/// 今日の日付を「入力なしのデフォルト」として取得
///
/// # 戻り値
/// `provenance = DefaultedToday`の正規化済み日付（手入力フォームの初期値用）
pub fn today() -> CanonicalDate {
    CanonicalDate {
        calendar_date: local_today(),
        is_today: true,
        provenance: DateProvenance::DefaultedToday,
    }
}

/// 任意の日付風文字列を正規化する
///
/// # 引数
/// * `input` - 日付文字列（None、空文字、時刻サフィックス付きも可）
///
/// # 戻り値
/// 必ず実在するカレンダー日付。以下のルールで決定します:
/// 1. 最初の空白で分割して時刻サフィックスを除去
/// 2. 「4桁-2桁-2桁」の厳密な形式チェック
/// 3. カレンダー上実在するかのチェック（2023-02-30などを拒否）
/// 4. いずれかに失敗した場合はローカルの今日（`InvalidDefaulted`）
pub fn normalize(input: Option<&str>) -> CanonicalDate {
    let today_date = local_today();

    let invalid = CanonicalDate {
        calendar_date: today_date,
        is_today: true,
        provenance: DateProvenance::InvalidDefaulted,
    };

    let raw = match input {
        Some(s) if !s.trim().is_empty() => s,
        _ => {
            log::debug!("日付入力が空のため今日の日付で補完します");
            return invalid;
        }
    };

    // 時刻サフィックスを除去（最初の空白より前だけを使用）
    let clean = raw.split(' ').next().unwrap_or("");

    if !is_strict_ymd_format(clean) {
        log::debug!("日付形式が不正のため今日の日付で補完します: input={raw}");
        return invalid;
    }

    match NaiveDate::parse_from_str(clean, "%Y-%m-%d") {
        Ok(date) => CanonicalDate {
            calendar_date: date,
            is_today: date == today_date,
            provenance: DateProvenance::FromReceipt,
        },
        Err(_) => {
            log::debug!("実在しない日付のため今日の日付で補完します: input={clean}");
            invalid
        }
    }
}

/// 「4桁-2桁-2桁」の厳密な形式チェック
fn is_strict_ymd_format(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != 10 {
        return false;
    }
    bytes.iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        _ => b.is_ascii_digit(),
    })
}

/// 正規化済み日付を表示用情報へ変換する（純粋関数、I/Oなし）
///
/// # 戻り値
/// 表示文字列と由来を説明するノート
pub fn display(date: &CanonicalDate) -> DateDisplay {
    let formatted = date.calendar_date.format("%b %-d, %Y").to_string();
    let note = match date.provenance {
        DateProvenance::InvalidDefaulted => "Using current date".to_string(),
        DateProvenance::DefaultedToday => "Today".to_string(),
        DateProvenance::FromReceipt => {
            if date.is_today {
                "Today".to_string()
            } else {
                "From receipt".to_string()
            }
        }
    };

    DateDisplay {
        formatted,
        raw: date.as_ymd_string(),
        note,
    }
}
