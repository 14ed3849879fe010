//! Webhook report rendering.
//!
//! Both renderers show the same information: wallet balances in the native
//! coin and USD, then the current and 24 hour average hashrate for every
//! active algorithm. They only differ in layout.

use chrono::{DateTime, SecondsFormat, Utc};
use hashrate_history::{AlgorithmSummary, WalletHistory};
use serde::Deserialize;
use web_utils::{format_hashrate, format_usd};

use crate::api::{Amount, WalletStats};
use crate::webhook::{Embed, EmbedField, WebhookPayload};

const EMBED_COLOR: u32 = 0x2f_80_ed;

/// Everything a renderer needs for one wallet report.
pub struct ReportContext<'a> {
    pub stats: &'a WalletStats,
    pub summaries: &'a [AlgorithmSummary],
    pub history: &'a WalletHistory,
    pub coin_to_usd: f64,
    pub ticker: &'a str,
    pub generated_at: DateTime<Utc>,
}

impl ReportContext<'_> {
    fn balance_lines(&self) -> [(&'static str, String); 4] {
        let line = |amount: &Amount| {
            format!(
                "{} {} ({})",
                amount,
                self.ticker,
                format_usd(amount.value() * self.coin_to_usd)
            )
        };
        [
            ("Balance", line(&self.stats.balance)),
            ("Pending (Unsold)", line(&self.stats.unsold)),
            ("Earned last 24h", line(&self.stats.paid24h)),
            ("Total Earned", line(&self.stats.paidtotal)),
        ]
    }

    fn rates(&self, row: &AlgorithmSummary) -> String {
        format!(
            "Current: {} | 24hr Avg: {}",
            format_hashrate(row.hashrate),
            format_hashrate(self.history.average(&row.algo))
        )
    }
}

fn worker_heading(row: &AlgorithmSummary) -> String {
    format!("{} - {} workers", row.algo, row.workers)
}

pub trait ReportRenderer: Send + Sync {
    fn render(&self, ctx: &ReportContext<'_>, username: &str) -> WebhookPayload;
}

/// Single markdown message in `content`.
pub struct PlainTextRenderer;

impl ReportRenderer for PlainTextRenderer {
    fn render(&self, ctx: &ReportContext<'_>, username: &str) -> WebhookPayload {
        let mut content = String::from("**Wallet Balance Update:**\n");
        for (label, value) in ctx.balance_lines() {
            content.push_str(&format!("{}: {}\n", label, value));
        }
        content.push_str("\n**Worker Stats:**");
        for row in ctx.summaries {
            content.push_str(&format!("\n- {}\n*{}*", worker_heading(row), ctx.rates(row)));
        }

        WebhookPayload {
            username: username.to_string(),
            content,
            embeds: Vec::new(),
        }
    }
}

/// One embed with a named field per balance and per algorithm.
pub struct EmbedRenderer;

impl ReportRenderer for EmbedRenderer {
    fn render(&self, ctx: &ReportContext<'_>, username: &str) -> WebhookPayload {
        let mut fields: Vec<EmbedField> = ctx
            .balance_lines()
            .into_iter()
            .map(|(label, value)| EmbedField {
                name: label.to_string(),
                value,
                inline: true,
            })
            .collect();

        if ctx.summaries.is_empty() {
            fields.push(EmbedField {
                name: "Worker Stats".to_string(),
                value: "No active workers".to_string(),
                inline: false,
            });
        }
        fields.extend(ctx.summaries.iter().map(|row| EmbedField {
            name: worker_heading(row),
            value: ctx.rates(row),
            inline: false,
        }));

        WebhookPayload {
            username: username.to_string(),
            content: String::new(),
            embeds: vec![Embed {
                title: "Wallet Balance Update".to_string(),
                color: Some(EMBED_COLOR),
                fields,
                timestamp: Some(
                    ctx.generated_at
                        .to_rfc3339_opts(SecondsFormat::Secs, true),
                ),
            }],
        }
    }
}

/// Report layout selected in the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderStyle {
    #[default]
    Plain,
    Embed,
}

impl RenderStyle {
    pub fn renderer(self) -> Box<dyn ReportRenderer> {
        match self {
            RenderStyle::Plain => Box::new(PlainTextRenderer),
            RenderStyle::Embed => Box::new(EmbedRenderer),
        }
    }
}
