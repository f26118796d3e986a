//! Server-rendered HTML pages.

use axum::response::Html;

use super::forms::{FormErrors, PredictForm};
use super::session::Flash;
use crate::domain::Occupation;

/// Escape text for an HTML body or a double-quoted attribute.
#[must_use]
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

fn layout(title: &str, flashes: &[Flash], username: Option<&str>, content: &str) -> Html<String> {
    let flash_html: String = flashes
        .iter()
        .map(|f| {
            format!(
                "<div class=\"flash flash-{}\">{}</div>\n",
                f.category,
                escape_html(&f.message)
            )
        })
        .collect();
    let account = match username {
        Some(name) => format!("<span class=\"user\">{}</span>", escape_html(name)),
        None => "<a href=\"/login\">Login</a> <a href=\"/signup\">Sign up</a>".to_string(),
    };

    Html(format!(
        "<!DOCTYPE html>
<html lang=\"en\">
<head>
<meta charset=\"utf-8\">
<title>{title} | Healthquote</title>
</head>
<body>
<nav><a href=\"/home\">Home</a> <a href=\"/predict\">Predict</a> <a href=\"/about\">About</a> <a href=\"/contact\">Contact</a> {account}</nav>
<main>
{flash_html}{content}
</main>
</body>
</html>
",
        title = escape_html(title),
    ))
}

fn field_errors(errors: &FormErrors, field: &str) -> String {
    errors
        .iter()
        .filter(|(f, _)| *f == field)
        .map(|(_, m)| format!("<span class=\"error\">{}</span>", escape_html(m)))
        .collect()
}

pub fn home(flashes: &[Flash], username: Option<&str>) -> Html<String> {
    layout(
        "Home",
        flashes,
        username,
        "<h1>Insurance Premium Predictor</h1>
<p>Estimate your insurance premium category from a few health and lifestyle details.</p>
<p><a href=\"/predict\">Get a prediction</a></p>",
    )
}

pub fn about(flashes: &[Flash], username: Option<&str>) -> Html<String> {
    layout(
        "About",
        flashes,
        username,
        "<h1>About</h1>
<p>Predictions come from a pre-trained classifier using BMI, age group, lifestyle risk, city tier, income and occupation.</p>",
    )
}

pub fn contact(flashes: &[Flash], username: Option<&str>) -> Html<String> {
    layout(
        "Contact",
        flashes,
        username,
        "<h1>Contact</h1>
<p>Questions about a prediction? Reach the team through your insurance advisor.</p>",
    )
}

pub fn signup(flashes: &[Flash], username: Option<&str>) -> Html<String> {
    layout(
        "SignUp",
        flashes,
        username,
        "<h1>Sign up</h1>
<p>Account registration is not available. Pick any username on the <a href=\"/login\">login</a> page.</p>",
    )
}

pub fn login(
    flashes: &[Flash],
    username: &str,
    errors: &FormErrors,
    next: Option<&str>,
) -> Html<String> {
    let action = match next {
        Some(n) => format!("/login?next={}", escape_html(n)),
        None => "/login".to_string(),
    };
    let content = format!(
        "<h1>Login</h1>
<form method=\"post\" action=\"{action}\">
<label for=\"username\">Username</label>
<input id=\"username\" name=\"username\" value=\"{username}\" minlength=\"3\" maxlength=\"50\" required>
{errors}
<button type=\"submit\">Login</button>
</form>",
        username = escape_html(username),
        errors = field_errors(errors, "username"),
    );
    layout("Login", flashes, None, &content)
}

pub fn predict(
    flashes: &[Flash],
    username: Option<&str>,
    form: &PredictForm,
    errors: &FormErrors,
    prediction: Option<&str>,
) -> Html<String> {
    let input = |name: &str, label: &str, value: &str, attrs: &str| {
        format!(
            "<p><label for=\"{name}\">{label}</label>
<input id=\"{name}\" name=\"{name}\" value=\"{value}\" {attrs}>
{errors}</p>\n",
            value = escape_html(value),
            errors = field_errors(errors, name),
        )
    };

    let smoker_options: String = [("True", "Yes"), ("False", "No")]
        .iter()
        .map(|(value, label)| {
            let selected = if form.smoker == *value { " selected" } else { "" };
            format!("<option value=\"{value}\"{selected}>{label}</option>")
        })
        .collect();
    let occupation_options: String = Occupation::ALL
        .iter()
        .map(|o| {
            let selected = if Occupation::parse(&form.occupation) == Some(*o) {
                " selected"
            } else {
                ""
            };
            format!(
                "<option value=\"{}\"{selected}>{}</option>",
                o.as_str(),
                o.label()
            )
        })
        .collect();

    let result = prediction
        .map(|p| {
            format!(
                "<section class=\"result\"><h2>Predicted premium category</h2><p>{}</p></section>",
                escape_html(p)
            )
        })
        .unwrap_or_default();

    let content = format!(
        "<h1>Predict your premium</h1>
<form method=\"post\" action=\"/predict\">
{age}{weight}{height}{income}<p><label for=\"smoker\">Do you Smoke?</label>
<select id=\"smoker\" name=\"smoker\">{smoker_options}</select>
{smoker_errors}</p>
{city}<p><label for=\"occupation\">Occupation</label>
<select id=\"occupation\" name=\"occupation\">{occupation_options}</select>
{occupation_errors}</p>
<button type=\"submit\">Predict</button>
</form>
{result}",
        age = input("age", "Age", &form.age, "type=\"number\" min=\"1\" max=\"120\""),
        weight = input(
            "weight",
            "Weight (kg)",
            &form.weight,
            "type=\"number\" step=\"any\" min=\"1\"",
        ),
        height = input(
            "height",
            "Height (m)",
            &form.height,
            "type=\"number\" step=\"any\" min=\"0.5\" max=\"2.5\""
        ),
        income = input(
            "income_lpa",
            "Annual Income (LPA)",
            &form.income_lpa,
            "type=\"number\" step=\"any\" min=\"0\""
        ),
        city = input("city", "City", &form.city, "minlength=\"2\""),
        smoker_errors = field_errors(errors, "smoker"),
        occupation_errors = field_errors(errors, "occupation"),
    );
    layout("Predict", flashes, username, &content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<b>\"Tom\" & 'Jerry'</b>"),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#x27;Jerry&#x27;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_flashes_are_escaped() {
        let flashes = vec![Flash {
            category: "success",
            message: "Hi <script>, have a good day!".to_string(),
        }];
        let Html(page) = home(&flashes, None);
        assert!(page.contains("flash-success"));
        assert!(page.contains("Hi &lt;script&gt;, have a good day!"));
        assert!(!page.contains("<script>"));
    }

    #[test]
    fn test_predict_page_keeps_values_and_errors() {
        let form = PredictForm {
            age: "150".into(),
            occupation: "student".into(),
            smoker: "False".into(),
            ..PredictForm::default()
        };
        let errors = vec![("age", "Enter valid age between 1 and 120".to_string())];
        let Html(page) = predict(&[], Some("asha"), &form, &errors, None);
        assert!(page.contains("value=\"150\""));
        assert!(page.contains("Enter valid age between 1 and 120"));
        assert!(page.contains("<option value=\"student\" selected>Student</option>"));
        assert!(page.contains("<option value=\"False\" selected>No</option>"));
        assert!(!page.contains("class=\"result\""));
    }
}
