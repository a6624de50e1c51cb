use crate::digest::{escape, impact_marker, BriefDigest};

const UP_COLOR: &str = "#22c55e";
const DOWN_COLOR: &str = "#ef4444";

pub struct EmailTemplate;

impl EmailTemplate {
    pub fn render(digest: &BriefDigest) -> String {
        let change_color = if digest.rising() { UP_COLOR } else { DOWN_COLOR };

        let mut rows = String::new();
        rows.push_str(&row("Sentiment", &format!("{} {}/100", escape(&digest.sentiment_label), digest.sentiment_score), None));
        if digest.is_morning {
            rows.push_str(&row("Gift Nifty Gap", &format!("{} pts ({})", digest.gift_gap.signed(0), digest.gift_signal), None));
            rows.push_str(&row("India VIX", &format!("{} ({})", digest.vix.grouped(2), digest.vix_level), None));
            rows.push_str(&row(
                "Key Pivots",
                &format!("R1 {} | PP {} | S1 {}", digest.r1.grouped(2), digest.pp.grouped(2), digest.s1.grouped(2)),
                None,
            ));
        }
        if let Some((verdict, move_pts)) = &digest.accuracy {
            let color = match verdict {
                brief_core::Verdict::OnTrack => Some(UP_COLOR),
                brief_core::Verdict::Reversed => Some(DOWN_COLOR),
                brief_core::Verdict::Tracking => None,
            };
            rows.push_str(&row("Morning Call", &format!("{} ({} pts)", verdict, escape(move_pts)), color));
        }
        if !digest.pivot_alerts.is_empty() {
            rows.push_str(&row("Pivot Alerts", &digest.pivot_alerts.join(" · "), None));
        }

        let news: String = digest
            .headlines
            .iter()
            .map(|h| {
                format!(
                    r#"<tr><td style="padding:6px 12px;font-size:11px;font-weight:700;color:#64748b;">{}</td><td style="padding:6px 12px;">{} {}</td></tr>"#,
                    escape(&h.tag),
                    impact_marker(h.impact),
                    escape(&h.headline)
                )
            })
            .collect();
        let news_section = if news.is_empty() {
            String::new()
        } else {
            format!(
                r#"<div style="padding:12px 20px 0;font-size:11px;font-weight:700;color:#64748b;">MARKET NEWS</div>
<table style="width:100%;border-collapse:collapse;">{news}</table>"#
            )
        };

        let verdict_section = digest
            .trading_verdict
            .as_deref()
            .map(|v| {
                format!(
                    r#"<div style="margin:16px 20px;padding:12px 16px;border-left:4px solid {UP_COLOR};background:#f0fdf4;">
  <div style="font-size:11px;font-weight:700;color:#15803d;margin-bottom:4px;">TRADING VERDICT</div>
  <div style="color:#334155;line-height:1.6;">{}</div>
</div>"#,
                    escape(v)
                )
            })
            .unwrap_or_default();

        let perspectives_section = digest
            .perspectives
            .as_ref()
            .map(|p| {
                format!(
                    r#"<div style="margin:16px 20px;padding:12px 16px;border:1px solid #e2e8f0;border-radius:8px;">
  <div style="font-size:11px;font-weight:700;color:#64748b;margin-bottom:4px;">3-VIEW ANALYSIS</div>
  <div style="font-weight:700;margin-bottom:8px;">📌 {}</div>
  <div style="padding:4px 0;">🟢 <b>Bull:</b> {}</div>
  <div style="padding:4px 0;">⚪ <b>Neutral:</b> {}</div>
  <div style="padding:4px 0;">🔴 <b>Bear:</b> {}</div>
</div>"#,
                    escape(&p.key_event),
                    escape(&p.bull_view),
                    escape(&p.neutral_view),
                    escape(&p.bear_view)
                )
            })
            .unwrap_or_default();

        let dashboard = digest
            .dashboard_url
            .as_deref()
            .map(|url| {
                format!(
                    r#"<div style="padding:16px 20px;text-align:center;"><a href="{}" style="display:inline-block;background:#0066cc;color:#fff;font-weight:700;padding:12px 32px;border-radius:8px;text-decoration:none;">Open Live Dashboard</a></div>"#,
                    escape(url)
                )
            })
            .unwrap_or_default();

        format!(
            r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><meta name="viewport" content="width=device-width,initial-scale=1"></head>
<body style="margin:0;padding:0;background:#f1f5f9;font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,sans-serif;">
<table width="100%" cellpadding="0" cellspacing="0" style="background:#f1f5f9;padding:32px 0;">
  <tr><td align="center">
    <table width="600" cellpadding="0" cellspacing="0" style="background:#ffffff;border-radius:8px;overflow:hidden;box-shadow:0 1px 3px rgba(0,0,0,0.1);">
      <tr><td>
        <div style="background:#1e293b;color:#fff;padding:12px 20px;font-size:18px;font-weight:700;">{mood} Nifty {session} &middot; {time} IST</div>
        <div style="padding:16px 20px;">
          <div style="font-size:11px;font-weight:700;color:#64748b;">NIFTY 50</div>
          <div style="font-size:36px;font-weight:700;color:{change_color};">{price}</div>
          <div style="font-size:16px;font-weight:600;color:{change_color};">{change} ({pct})</div>
        </div>
        <table style="width:100%;border-collapse:collapse;">{rows}</table>
        {news_section}
        {verdict_section}
        {perspectives_section}
        {dashboard}
      </td></tr>
      <tr><td style="padding:16px 20px;border-top:1px solid #e2e8f0;">
        <p style="margin:0;color:#94a3b8;font-size:12px;">{date} &middot; AI-generated brief, not financial advice</p>
      </td></tr>
    </table>
  </td></tr>
</table>
</body>
</html>"#,
            mood = digest.mood_marker(),
            session = escape(&digest.session),
            time = escape(&digest.time),
            date = escape(&digest.date),
            price = digest.nifty_price.grouped(2),
            change = digest.nifty_change.signed(2),
            pct = digest.nifty_pct.percent(),
        )
    }

    /// Plain-text alternative body.
    pub fn render_plain(digest: &BriefDigest) -> String {
        let mut text = format!(
            "Nifty {} | {} {}\n\nNifty 50: {} ({})\nSentiment: {} {}/100\n",
            digest.session,
            digest.date,
            digest.time,
            digest.nifty_price.grouped(2),
            digest.nifty_change.signed(2),
            digest.sentiment_label,
            digest.sentiment_score
        );
        if let Some(verdict) = &digest.trading_verdict {
            let short: String = verdict.chars().take(200).collect();
            text.push_str(&format!("Verdict: {}\n", short));
        }
        if let Some(url) = &digest.dashboard_url {
            text.push_str(&format!("\nDashboard: {}\n", url));
        }
        text
    }
}

fn row(label: &str, value: &str, color: Option<&str>) -> String {
    let style = color.map(|c| format!("color:{};", c)).unwrap_or_default();
    format!(
        r#"<tr><td style="padding:8px 12px;color:#94a3b8;">{label}</td><td style="padding:8px 12px;font-weight:600;{style}">{value}</td></tr>"#
    )
}

/// Telegram `parse_mode=HTML` message body.
pub struct TelegramTemplate;

impl TelegramTemplate {
    pub fn render(digest: &BriefDigest) -> String {
        let trend = if digest.rising() { "📈" } else { "📉" };
        let mut msg = format!(
            "<b>{} NIFTY {} | {}</b>\n⏰ {} IST\n\n\
             <b>{} Nifty 50</b>\n  Price:  <code>{}</code>\n  Change: <code>{}  {}</code>\n  Mood:   <b>{} {}/100</b>\n\n",
            digest.mood_marker(),
            escape(&digest.session.to_uppercase()),
            escape(&digest.date),
            escape(&digest.time),
            trend,
            digest.nifty_price.grouped(2),
            digest.nifty_change.signed(2),
            digest.nifty_pct.percent(),
            escape(&digest.sentiment_label),
            digest.sentiment_score,
        );

        if digest.is_morning {
            msg.push_str(&format!(
                "<b>Gift Nifty Gap</b>\n  Gap: <code>{} pts</code>  ({})\n\n\
                 <b>📊 India VIX</b>\n  <code>{}</code>  {}\n\n\
                 <b>🎯 Key Pivots</b>\n  R1: <code>{}</code>  |  PP: <code>{}</code>  |  S1: <code>{}</code>\n\n",
                digest.gift_gap.signed(0),
                digest.gift_signal,
                digest.vix.grouped(2),
                digest.vix_level,
                digest.r1.grouped(2),
                digest.pp.grouped(2),
                digest.s1.grouped(2),
            ));
        }

        if let Some((verdict, move_pts)) = &digest.accuracy {
            msg.push_str(&format!("<b>🧭 Morning Call</b>\n  {} ({} pts)\n\n", verdict, escape(move_pts)));
        }

        if !digest.pivot_alerts.is_empty() {
            msg.push_str("<b>🚨 Pivot Alerts</b>\n");
            for alert in &digest.pivot_alerts {
                msg.push_str(&format!("  {}\n", alert));
            }
            msg.push('\n');
        }

        if !digest.headlines.is_empty() {
            msg.push_str("<b>📰 Market News</b>\n");
            for h in &digest.headlines {
                msg.push_str(&format!("{} {}\n", impact_marker(h.impact), escape(&h.headline)));
            }
            msg.push('\n');
        }

        if let Some(verdict) = &digest.trading_verdict {
            msg.push_str(&format!("<b>⚡ Trading Verdict</b>\n{}\n\n", escape(verdict)));
        }

        if let Some(p) = &digest.perspectives {
            msg.push_str(&format!(
                "<b>3-VIEW ANALYSIS</b>\n📌 <i>{}</i>\n🟢 Bull: {}\n⚪ Neutral: {}\n🔴 Bear: {}\n\n",
                escape(&p.key_event),
                escape(&p.bull_view),
                escape(&p.neutral_view),
                escape(&p.bear_view),
            ));
        }

        if let Some(url) = &digest.dashboard_url {
            msg.push_str(&format!("🔗 <a href='{}'>Open Live Dashboard</a>\n", escape(url)));
        }
        msg.push_str("<i>Not financial advice</i>");
        msg
    }
}
