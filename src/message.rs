//! Broadcast message texts. Subscribers read Japanese, so the bodies are
//! kept in Japanese.

use chrono::{DateTime, Local, Utc};

use crate::models::ClassificationResult;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const TEST_MESSAGE: &str = "Hello, this is a test message from LINE Broadcast API.";

fn local_timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string()
}

/// Alert sent by the one-shot check when tickets are on sale.
pub fn sales_started(url: &str, at: DateTime<Utc>) -> String {
    format!(
        "🎫 チケット販売開始！\n\n❗️ 完売していません ❗️\n\n時刻: {}\nURL: {}\n\nすぐにチケットをチェックしてください！",
        local_timestamp(at),
        url
    )
}

/// Status update sent by the watcher for either state.
pub fn status_update(classification: &ClassificationResult, url: &str, at: DateTime<Utc>) -> String {
    if classification.is_sold_out {
        format!(
            "💔 チケット完売中\n\n時刻: {}\n完売要素数: {}\n\n引き続き監視を続けます...",
            local_timestamp(at),
            classification.sold_out_count()
        )
    } else {
        format!(
            "🎫 チケット販売状況更新！\n\n❗️ 完売していません ❗️\n\n時刻: {}\nURL: {}\n\nすぐにチケットをチェックしてください！",
            local_timestamp(at),
            url
        )
    }
}
