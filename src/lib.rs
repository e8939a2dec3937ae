// SmartSpend 経費キャプチャコア
//
// レシート／手入力から確定済み経費までのキャプチャ状態機械と、
// 保存確定イベントを独立した表示コンポーネントへ配信する同期バスを提供します。
pub mod features;
pub mod shared;
