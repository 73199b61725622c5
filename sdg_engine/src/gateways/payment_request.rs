use serde::{ser::Serializer, Serialize};

/// Ordered form fields for a gateway checkout. Serializes as a JSON object, keeping the field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields(Vec<(String, String)>);

impl FormFields {
    pub fn push<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.0.push((key.into(), value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for FormFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(k, v)| (k, v)))
    }
}

/// A signed checkout request. The donor's browser posts `form_fields` to `action_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub action_url: String,
    pub form_fields: FormFields,
}

impl PaymentRequest {
    /// Renders a self-submitting HTML page that posts the form to the gateway.
    pub fn to_html_form(&self) -> String {
        let inputs = self
            .form_fields
            .iter()
            .map(|(k, v)| format!(r#"    <input type="hidden" name="{}" value="{}">"#, escape_html(k), escape_html(v)))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Redirecting to payment</title></head>
<body onload="document.forms[0].submit()">
  <form method="post" action="{}">
{inputs}
    <noscript><button type="submit">Continue to payment</button></noscript>
  </form>
</body>
</html>
"#,
            escape_html(&self.action_url)
        )
    }
}

fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            c => result.push(c),
        }
    }
    result
}
