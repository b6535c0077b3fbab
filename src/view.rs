//! Server-rendered quiz page: the question form, the player controls, and the
//! score history. All dynamic text goes through `escape_html`.

use std::fmt::Write;

use crate::controller::Round;
use crate::domain::ANSWER_FIELD_PREFIX;
use crate::logic::Snapshot;
use crate::util::escape_html;

/// Shown whenever no round is on screen. An empty name on `/new-player`
/// means the current player.
const RECOVERY_CONTROLS: &str = concat!(
  r#"<form id="recovery" method="post" action="/start">"#,
  r#"<button type="submit">Try again</button>"#,
  r#"<button type="submit" formaction="/new-player">New player</button>"#,
  "</form>",
);

/// `notice` is an error line shown above the form (e.g. a validation prompt);
/// without one, the controller's last fetch error is shown instead.
pub fn render_page(snap: &Snapshot, notice: Option<&str>) -> String {
  let loading = snap.round.is_none() && snap.state == "loading";
  let mut body = String::new();

  let _ = write!(body, "<h1>Trivia</h1>");
  if let Some(text) = notice.or(snap.error.as_deref()) {
    let _ = write!(body, r#"<p class="notice error" role="status">{}</p>"#, escape_html(text));
  }

  match &snap.round {
    Some(round) => body.push_str(&render_round_form(round, snap.user.as_deref())),
    None if loading => {
      body.push_str(r#"<div id="loading-container"><p>Loading questions…</p></div>"#);
      body.push_str(RECOVERY_CONTROLS);
    }
    None => body.push_str(RECOVERY_CONTROLS),
  }

  body.push_str(&render_scores(&snap.scores));

  let refresh = if loading { r#"<meta http-equiv="refresh" content="1">"# } else { "" };
  format!(
    r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
{refresh}<title>Trivia</title>
<link rel="stylesheet" href="/static/style.css">
</head>
<body>
<main>
{body}
</main>
</body>
</html>
"#
  )
}

fn render_round_form(round: &Round, user: Option<&str>) -> String {
  let mut out = String::new();
  let _ = write!(out, r#"<form id="trivia-form" method="post" action="/play">"#);
  let _ = write!(out, r#"<input type="hidden" name="round" value="{}">"#, round.seq);
  out.push_str(r#"<div id="question-container">"#);

  for group in &round.model.groups {
    out.push_str("<fieldset class=\"question\">");
    let _ = write!(out, "<legend>{}. {}</legend>", group.group_id + 1, escape_html(&group.prompt));
    if !group.category.is_empty() {
      let _ = write!(
        out,
        r#"<p class="meta">{} · {}</p>"#,
        escape_html(&group.category),
        escape_html(&group.difficulty)
      );
    }
    for choice in &group.choices {
      let text = escape_html(&choice.display_text);
      let _ = write!(
        out,
        r#"<label><input type="radio" name="{}{}" value="{}"> {}</label>"#,
        ANSWER_FIELD_PREFIX, group.group_id, text, text
      );
    }
    out.push_str("</fieldset>");
  }
  out.push_str("</div>");

  let _ = write!(
    out,
    r#"<div class="player"><label>Name <input type="text" name="username" id="username" value="{}" autocomplete="nickname"></label>"#,
    escape_html(user.unwrap_or(""))
  );
  out.push_str(r#"<button type="submit">Submit answers</button>"#);
  out.push_str(r#"<button type="submit" id="new-player" formaction="/new-player">New player</button>"#);
  out.push_str("</div></form>");
  out
}

fn render_scores(scores: &[(String, Vec<u32>)]) -> String {
  let mut out = String::from(r#"<section id="score-board"><h3>Score History</h3>"#);
  if scores.is_empty() {
    out.push_str("<p>No scores yet.</p>");
  } else {
    out.push_str("<table><thead><tr><th>Player</th><th>Scores</th></tr></thead><tbody>");
    for (user, list) in scores {
      let joined = list.iter().map(u32::to_string).collect::<Vec<_>>().join(", ");
      let _ = write!(out, "<tr><td>{}</td><td>{}</td></tr>", escape_html(user), joined);
    }
    out.push_str("</tbody></table>");
  }
  out.push_str("</section>");
  out
}
