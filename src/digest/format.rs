//! Human-readable score lines and the summary email bodies

use crate::matches::MatchRecord;

const TITLE: &str = "Tennis Matches Daily Summary";
const INTRO: &str = "Here's a summary of yesterday's tennis matches:";
const EMPTY: &str = "No matches were completed yesterday.";
const FOOTER: &str = "This is an automated summary from your Tennis Score App.";

/// Rendered summary email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestBody {
    pub text: String,
    pub html: String,
}

/// One-line score, e.g. `Completed: Sets: [6-4, 3-6, 7-5]`
pub fn format_score(record: &MatchRecord) -> String {
    let state = &record.state;
    let status = if state.is_complete {
        "Completed"
    } else {
        "In progress"
    };

    let mut line = format!("{}: ", status);

    if !state.completed_sets.is_empty() {
        let sets: Vec<String> = state.completed_sets.iter().map(|s| s.to_string()).collect();
        line.push_str(&format!("Sets: [{}]", sets.join(", ")));
    }

    if !state.is_complete {
        line.push_str(&format!(
            " Current game: {}-{}, Games: {}-{}",
            state.player1.points, state.player2.points, state.player1.games, state.player2.games
        ));
    }

    line
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

struct SummaryLine {
    players: String,
    score: String,
    date: String,
}

fn summary_lines(matches: &[MatchRecord]) -> Vec<SummaryLine> {
    matches
        .iter()
        .map(|m| SummaryLine {
            players: format!("{} vs. {}", m.player1_name, m.player2_name),
            score: format_score(m),
            date: m.created_at.format("%Y-%m-%d").to_string(),
        })
        .collect()
}

/// Plain text and HTML bodies for a list of matches
pub fn render_summary(matches: &[MatchRecord]) -> DigestBody {
    let lines = summary_lines(matches);

    let text_matches = if lines.is_empty() {
        EMPTY.to_string()
    } else {
        lines
            .iter()
            .map(|l| format!("{}\n{}\n{}", l.players, l.score, l.date))
            .collect::<Vec<_>>()
            .join("\n\n")
    };
    let text = format!("{}\n\n{}\n\n{}\n\n{}\n", TITLE, INTRO, text_matches, FOOTER);

    let html_matches = if lines.is_empty() {
        format!("<p>{}</p>", EMPTY)
    } else {
        lines
            .iter()
            .map(|l| {
                format!(
                    concat!(
                        "<div class=\"match\">",
                        "<div class=\"match-header\">{}</div>",
                        "<div class=\"match-score\">{}</div>",
                        "<div class=\"match-date\">{}</div>",
                        "</div>"
                    ),
                    escape_html(&l.players),
                    escape_html(&l.score),
                    escape_html(&l.date)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };
    let html = format!(
        concat!(
            "<!DOCTYPE html>\n<html>\n<head>\n<style>\n{}</style>\n</head>\n<body>\n",
            "<div class=\"container\">\n<h1>{}</h1>\n<p>{}</p>\n{}\n",
            "<div class=\"footer\"><p>{}</p></div>\n</div>\n</body>\n</html>\n"
        ),
        STYLE, TITLE, INTRO, html_matches, FOOTER
    );

    DigestBody { text, html }
}

const STYLE: &str = "\
body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; }
.container { max-width: 600px; margin: 0 auto; padding: 20px; }
h1 { color: #2c5282; border-bottom: 1px solid #e2e8f0; padding-bottom: 10px; }
.match { margin-bottom: 20px; padding: 15px; border-radius: 5px; background-color: #f8fafc; }
.match-header { font-weight: bold; font-size: 18px; margin-bottom: 5px; }
.match-score { color: #4a5568; }
.match-date { color: #718096; font-size: 14px; }
.footer { margin-top: 30px; font-size: 14px; color: #718096; border-top: 1px solid #e2e8f0; padding-top: 10px; }
";
