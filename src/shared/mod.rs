/// 共有モジュール
///
/// 機能横断で使用される設定・日付正規化のユーティリティ群です。
pub mod config;
pub mod dates;
