//! HTML templates for the web interface.

use serde_json::Value;

use super::charts;
use crate::analytics::{LogSummary, MinuteBucket};
use crate::documents::DocumentTable;
use crate::models::{display_value, ApiStatus, ModelLogEntry};
use crate::review::{field_label, is_multiline, ReviewState, FIELD_PREFIX};

/// Severity of an inline message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Success,
    Info,
    Warning,
    Error,
}

impl Notice {
    fn class(self) -> &'static str {
        match self {
            Notice::Success => "notice success",
            Notice::Info => "notice info",
            Notice::Warning => "notice warning",
            Notice::Error => "notice error",
        }
    }
}

/// Render an inline message box.
pub fn notice(kind: Notice, text: &str) -> String {
    format!(
        r#"<div class="{}" role="status">{}</div>"#,
        kind.class(),
        html_escape(text)
    )
}

fn notices(items: &[(Notice, &str)]) -> String {
    items
        .iter()
        .map(|(kind, text)| notice(*kind, text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Base HTML layout with navigation.
pub fn base_template(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - Logistics Document Processor</title>
    <link rel="stylesheet" href="/static/style.css">
</head>
<body>
    <header id="main-header">
        <nav>
            <a href="/" class="logo">Logistics Document Automation</a>
            <a href="/documents">documents</a>
            <a href="/model-logs">model log</a>
            <a href="/model-logs/test">test log</a>
        </nav>
    </header>
    <main>
        <h1>{title}</h1>
        {content}
    </main>
</body>
</html>"#,
        title = html_escape(title),
        content = content
    )
}

/// API and database connectivity badges.
pub fn status_banner(status: &ApiStatus) -> String {
    let api = if status.is_connected() {
        notice(Notice::Success, "API Connected")
    } else {
        notice(Notice::Error, "API Disconnected")
    };
    let db = if status.database_connected() {
        notice(Notice::Success, "Database Connected")
    } else {
        notice(Notice::Warning, "Database Disconnected")
    };
    format!(r#"<div class="columns">{}{}</div>"#, api, db)
}

/// Upload page with the file picker.
pub fn upload_page(status: &ApiStatus, messages: &[(Notice, &str)]) -> String {
    let content = format!(
        r#"
    {}
    {}
    <form class="upload" action="/extract" method="post" enctype="multipart/form-data">
        <label for="file">Upload PDF</label>
        <input type="file" id="file" name="file" accept="application/pdf,.pdf" required>
        <button type="submit">Extract Document</button>
    </form>
    "#,
        status_banner(status),
        notices(messages)
    );
    base_template("Upload", &content)
}

/// Shown when the backend says the upload is not a logistics document.
pub fn invalid_document(message: &str) -> String {
    let content = format!(
        r#"
    {}
    <p><a href="/" class="button">Try Again</a></p>
    "#,
        notice(Notice::Error, message)
    );
    base_template("Upload", &content)
}

/// Editable review form for extracted fields.
pub fn review_form(state: &ReviewState, messages: &[(Notice, &str)], show_modified: bool) -> String {
    let mut inputs = String::new();

    for name in state.field_order() {
        let id = format!("{}{}", FIELD_PREFIX, name);
        let value = html_escape(&state.edited_text(&name));
        let modified = if show_modified && state.is_modified(&name) {
            r#"<span class="modified">Modified</span>"#
        } else {
            ""
        };

        let input = if is_multiline(&name) {
            format!(
                r#"<textarea id="{id}" name="{id}" rows="3">{value}</textarea>"#,
                id = html_escape(&id),
                value = value
            )
        } else {
            format!(
                r#"<input type="text" id="{id}" name="{id}" value="{value}">"#,
                id = html_escape(&id),
                value = value
            )
        };

        inputs.push_str(&format!(
            r#"
        <div class="field">
            <label for="{}">{}</label> {}
            {}
        </div>"#,
            html_escape(&id),
            html_escape(&field_label(&name)),
            modified,
            input
        ));
    }

    let summary = if show_modified {
        let corrections = state.corrections();
        if corrections.is_empty() {
            String::new()
        } else {
            let names: Vec<&str> = corrections.keys().map(String::as_str).collect();
            notice(
                Notice::Info,
                &format!("{} field(s) modified: {}", names.len(), names.join(", ")),
            )
        }
    } else {
        String::new()
    };

    let exists_warning = if state.already_exists {
        notice(Notice::Warning, "document already in db")
    } else {
        String::new()
    };

    let original_json =
        serde_json::to_string(&state.original_fields).unwrap_or_else(|_| "{}".to_string());
    let extraction_json = serde_json::to_string(&state.extraction).unwrap_or_default();
    let save_disabled = if state.already_exists { " disabled" } else { "" };

    let content = format!(
        r#"
    {exists}
    {messages}
    <form class="review" action="/review" method="post">
        <h2>Review Extracted Fields</h2>
        <p class="muted">{filename}</p>
        <input type="hidden" name="document_hash" value="{hash}">
        <input type="hidden" name="filename" value="{filename}">
        <input type="hidden" name="storage_url" value="{storage}">
        <input type="hidden" name="already_exists" value="{exists_flag}">
        <input type="hidden" name="original_fields" value="{original}">
        <input type="hidden" name="extraction" value="{extraction}">
        <div class="fields">{inputs}
        </div>
        {summary}
        <div class="actions">
            <button type="submit" name="action" value="save"{save_disabled}>Save</button>
            <button type="submit" name="action" value="check">Check Changes</button>
            <button type="submit" name="action" value="cancel" formnovalidate>Cancel</button>
        </div>
    </form>
    "#,
        exists = exists_warning,
        messages = notices(messages),
        filename = html_escape(state.filename.as_deref().unwrap_or("")),
        hash = html_escape(state.document_hash.as_deref().unwrap_or("")),
        storage = html_escape(state.storage_url.as_deref().unwrap_or("")),
        exists_flag = state.already_exists,
        original = html_escape(&original_json),
        extraction = html_escape(&extraction_json),
        inputs = inputs,
        summary = summary,
        save_disabled = save_disabled
    );
    base_template("Review", &content)
}

/// Browser table of stored documents.
pub fn documents_page(
    table: &DocumentTable,
    total: Option<u64>,
    query: &str,
    messages: &[(Notice, &str)],
) -> String {
    let mut rows = String::new();

    for doc in &table.documents {
        let id = doc.id();
        let cell = |key: &str| html_escape(&doc.text(key).unwrap_or_else(|| "N/A".to_string()));
        let encoded = urlencoding::encode(&id);

        rows.push_str(&format!(
            r#"
        <tr data-id="{id}">
            <td><a href="/documents/{encoded}">{id}</a></td>
            <td>{filename}</td>
            <td>{tracking}</td>
            <td>{shipper}</td>
            <td>{receiver}</td>
            <td>{carrier}</td>
            <td>{status}</td>
            <td>{shipment}</td>
            <td>{created}</td>
            <td><a href="/documents/{encoded}/delete" class="danger">delete</a></td>
        </tr>"#,
            id = html_escape(&id),
            encoded = encoded,
            filename = cell("filename"),
            tracking = cell("tracking_number"),
            shipper = cell("shipper_name"),
            receiver = cell("receiver_name"),
            carrier = cell("carrier"),
            status = cell("status"),
            shipment = cell("shipment_date"),
            created = cell("created_at"),
        ));
    }

    let listing = if table.is_empty() {
        if query.trim().is_empty() {
            notice(Notice::Info, "No documents in database")
        } else {
            notice(Notice::Info, "No documents match the filter")
        }
    } else {
        format!(
            r#"
    <table class="file-listing" id="document-table">
        <thead>
            <tr>
                <th>ID</th>
                <th>Filename</th>
                <th>Tracking Number</th>
                <th>Shipper</th>
                <th>Receiver</th>
                <th>Carrier</th>
                <th>Status</th>
                <th>Shipment Date</th>
                <th>Created</th>
                <th></th>
            </tr>
        </thead>
        <tbody>{}
        </tbody>
    </table>"#,
            rows
        )
    };

    let total_line = match total {
        Some(total) => format!("Total documents: {} (showing {})", total, table.len()),
        None => format!("Showing {} documents", table.len()),
    };

    let content = format!(
        r#"
    {messages}
    <form class="filter" action="/documents" method="get">
        <input type="search" name="q" value="{query}" placeholder="filter documents">
        <button type="submit">Filter</button>
        <a href="/documents">Refresh</a>
    </form>
    <p class="muted">{total}</p>
    {listing}
    "#,
        messages = notices(messages),
        query = html_escape(query),
        total = html_escape(&total_line),
        listing = listing
    );
    base_template("Database Content", &content)
}

/// Full JSON of one document.
pub fn document_detail(id: &str, detail: &Value) -> String {
    let pretty = serde_json::to_string_pretty(detail).unwrap_or_default();
    let content = format!(
        r#"
    <nav class="breadcrumb">
        <a href="/documents">Documents</a> / {id}
    </nav>
    <pre class="json">{json}</pre>
    <p><a href="/documents/{encoded}/delete" class="danger">Delete this document</a></p>
    "#,
        id = html_escape(id),
        json = html_escape(&pretty),
        encoded = urlencoding::encode(id)
    );
    base_template(&format!("Document {}", id), &content)
}

/// Confirmation step before deleting.
pub fn delete_confirm(id: &str) -> String {
    let content = format!(
        r#"
    {}
    <form action="/documents/{}/delete" method="post" class="actions">
        <button type="submit" class="danger">Yes, Delete</button>
        <a href="/documents">Cancel</a>
    </form>
    "#,
        notice(
            Notice::Warning,
            &format!("Are you sure you want to delete document {}?", id)
        ),
        urlencoding::encode(id)
    );
    base_template("Delete Document", &content)
}

/// Analytics over model log entries.
pub fn model_logs_page(
    entries: &[ModelLogEntry],
    summary: &LogSummary,
    buckets: &[MinuteBucket],
    backend_total: Option<u64>,
    limit: u32,
) -> String {
    if entries.is_empty() {
        let content = format!(
            r#"
    {}
    <p><a href="/model-logs/test">Create a test entry</a></p>
    "#,
            notice(Notice::Info, "No model logs in database")
        );
        return base_template("Model Log", &content);
    }

    let shown = match backend_total {
        Some(total) => format!(
            "Showing {} most recent logs (limit {}, total {})",
            entries.len(),
            limit,
            total
        ),
        None => format!("Total model logs: {}", entries.len()),
    };

    let content = format!(
        r#"
    <p class="muted">{shown}</p>
    <div class="metrics">
        <div class="metric"><span class="metric-label">Total Logs</span><span class="metric-value">{total}</span></div>
        <div class="metric"><span class="metric-label">Successful</span><span class="metric-value">{successes}</span><span class="metric-delta">{success_pct:.1}%</span></div>
        <div class="metric"><span class="metric-label">With Corrections</span><span class="metric-value">{corrections}</span><span class="metric-delta">{correction_pct:.1}%</span></div>
    </div>
    <div class="charts">
        <figure>{bar}<figcaption>Success vs corrections</figcaption></figure>
        <figure>{pie}<figcaption>Success distribution</figcaption></figure>
        <figure class="wide">{series}<figcaption>Success rate per minute</figcaption></figure>
    </div>
    <h2>Entries</h2>
    {table}
    "#,
        shown = html_escape(&shown),
        total = summary.total,
        successes = summary.successes,
        success_pct = summary.success_pct(),
        corrections = summary.corrections,
        correction_pct = summary.correction_pct(),
        bar = charts::success_bar_chart(summary),
        pie = charts::success_pie_chart(summary),
        series = charts::success_rate_series(buckets),
        table = model_log_table(entries)
    );
    base_template("Model Log", &content)
}

fn model_log_table(entries: &[ModelLogEntry]) -> String {
    let mut rows = String::new();
    for entry in entries {
        let opt = |v: &Option<Value>| v.as_ref().map(display_value).unwrap_or_default();
        let corrections = match &entry.corrections_made {
            Some(Value::Object(map)) if !map.is_empty() => {
                map.keys().cloned().collect::<Vec<_>>().join(", ")
            }
            _ => String::new(),
        };
        let link = match entry.document_link.as_deref() {
            Some(url) if !url.is_empty() => format!(
                r#"<a href="{}">link</a>"#,
                html_escape(url)
            ),
            _ => String::new(),
        };

        rows.push_str(&format!(
            r#"
        <tr class="{class}">
            <td>{id}</td>
            <td>{success}</td>
            <td>{document_id}</td>
            <td><code>{hash}</code></td>
            <td>{link}</td>
            <td>{corrections}</td>
            <td>{reason}</td>
            <td>{created}</td>
        </tr>"#,
            class = if entry.success { "ok" } else { "corrected" },
            id = html_escape(&opt(&entry.id)),
            success = if entry.success { "yes" } else { "no" },
            document_id = html_escape(&opt(&entry.document_id)),
            hash = html_escape(entry.document_hash.as_deref().unwrap_or("")),
            link = link,
            corrections = html_escape(&corrections),
            reason = html_escape(entry.failure_reason.as_deref().unwrap_or("")),
            created = html_escape(entry.created_at.as_deref().unwrap_or("")),
        ));
    }

    format!(
        r#"
    <table class="file-listing" id="model-log-table">
        <thead>
            <tr>
                <th>ID</th>
                <th>Success</th>
                <th>Document</th>
                <th>Hash</th>
                <th>Link</th>
                <th>Corrections</th>
                <th>Failure Reason</th>
                <th>Created</th>
            </tr>
        </thead>
        <tbody>{}
        </tbody>
    </table>"#,
        rows
    )
}

/// Form values for the synthetic model log entry.
#[derive(Debug, Clone)]
pub struct TestLogDefaults<'a> {
    pub success: bool,
    pub document_id: &'a str,
    pub document_hash: &'a str,
    pub document_link: &'a str,
    pub failure_reason: &'a str,
    pub corrections_count: &'a str,
}

impl Default for TestLogDefaults<'_> {
    fn default() -> Self {
        Self {
            success: true,
            document_id: "1",
            document_hash: "test_hash_12345",
            document_link: "https://example.com/test.pdf",
            failure_reason: "",
            corrections_count: "0",
        }
    }
}

/// Page for posting a synthetic model log entry.
pub fn model_log_test_page(
    defaults: &TestLogDefaults<'_>,
    messages: &[(Notice, &str)],
    created: Option<&Value>,
    recent: &[ModelLogEntry],
    recent_error: Option<&str>,
) -> String {
    let created_section = created
        .map(|value| {
            format!(
                r#"<pre class="json">{}</pre>"#,
                html_escape(&serde_json::to_string_pretty(value).unwrap_or_default())
            )
        })
        .unwrap_or_default();

    let recent_section = match recent_error {
        Some(err) => notice(Notice::Error, err),
        None if recent.is_empty() => notice(
            Notice::Info,
            "No model logs found. Create one using the form above!",
        ),
        None => model_log_table(recent),
    };

    let content = format!(
        r#"
    {info}
    {messages}
    {created}
    <form class="test-log" action="/model-logs/test" method="post">
        <h2>Create Test Model Log Entry</h2>
        <div class="fields">
            <div class="field">
                <label for="success">Success</label>
                <select id="success" name="success">
                    <option value="true"{yes}>true</option>
                    <option value="false"{no}>false</option>
                </select>
            </div>
            <div class="field">
                <label for="document_id">Document ID</label>
                <input type="number" id="document_id" name="document_id" min="1" value="{document_id}">
            </div>
            <div class="field">
                <label for="document_hash">Document Hash</label>
                <input type="text" id="document_hash" name="document_hash" value="{hash}">
            </div>
            <div class="field">
                <label for="document_link">Document Link</label>
                <input type="text" id="document_link" name="document_link" value="{link}">
            </div>
            <div class="field">
                <label for="failure_reason">Failure Reason</label>
                <input type="text" id="failure_reason" name="failure_reason" value="{reason}">
            </div>
            <div class="field">
                <label for="corrections_count">Number of Corrections</label>
                <input type="number" id="corrections_count" name="corrections_count" min="0" value="{count}">
            </div>
        </div>
        <div class="actions">
            <button type="submit">Create Test Model Log Entry</button>
        </div>
    </form>
    <h2>Recent Model Logs</h2>
    <p><a href="/model-logs/test">Refresh Logs</a></p>
    {recent}
    "#,
        info = notice(
            Notice::Info,
            "This page allows you to test writing entries to the model log."
        ),
        messages = notices(messages),
        created = created_section,
        yes = if defaults.success { " selected" } else { "" },
        no = if defaults.success { "" } else { " selected" },
        document_id = html_escape(defaults.document_id),
        hash = html_escape(defaults.document_hash),
        link = html_escape(defaults.document_link),
        reason = html_escape(defaults.failure_reason),
        count = html_escape(defaults.corrections_count),
        recent = recent_section
    );
    base_template("Test Model Log Creation", &content)
}

/// Generic error page.
pub fn error_page(title: &str, message: &str) -> String {
    let content = format!(
        r#"
    {}
    <p><a href="/">Back to upload</a></p>
    "#,
        notice(Notice::Error, message)
    );
    base_template(title, &content)
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// CSS styles for the web interface - minimal text-based design.
pub const CSS: &str = r#"
:root {
    --bg: #fff;
    --text: #222;
    --text-muted: #666;
    --link: #0066cc;
    --border: #ccc;
    --ok: #1a7f37;
    --ok-bg: #e6f4ea;
    --warn: #8a6100;
    --warn-bg: #fff8e1;
    --err: #b42318;
    --err-bg: #fdecea;
    --info-bg: #e8f0fe;
}

@media (prefers-color-scheme: dark) {
    :root {
        --bg: #1a1a1a;
        --text: #e0e0e0;
        --text-muted: #888;
        --link: #6ab0ff;
        --border: #444;
        --ok-bg: #15301f;
        --warn-bg: #3a3520;
        --err-bg: #3b1d1b;
        --info-bg: #1d2a3d;
    }
}

* { box-sizing: border-box; margin: 0; padding: 0; }

body {
    font-family: 'Lucida Console', 'Courier New', monospace;
    font-size: 14px;
    background: var(--bg);
    color: var(--text);
    line-height: 1.5;
}

a { color: var(--link); }

#main-header { border-bottom: 1px solid var(--border); padding: 8px 16px; }
#main-header nav a { margin-right: 16px; }
#main-header .logo { font-weight: bold; }

main { padding: 16px; max-width: 1200px; }
h1 { font-size: 20px; margin-bottom: 12px; }
h2 { font-size: 16px; margin: 16px 0 8px; }

.muted { color: var(--text-muted); margin: 8px 0; }
.columns { display: flex; gap: 12px; }
.columns > * { flex: 1; }

.notice { padding: 8px 12px; margin: 8px 0; border-left: 4px solid var(--border); }
.notice.success { background: var(--ok-bg); border-color: var(--ok); }
.notice.info { background: var(--info-bg); border-color: var(--link); }
.notice.warning { background: var(--warn-bg); border-color: var(--warn); }
.notice.error { background: var(--err-bg); border-color: var(--err); }

form { margin: 12px 0; }
.fields { display: grid; grid-template-columns: repeat(2, 1fr); gap: 8px 16px; }
.field label { display: block; color: var(--text-muted); }
.field input, .field textarea, .field select { width: 100%; padding: 4px; font: inherit; }
.modified { color: var(--warn); font-size: 12px; }
.actions { display: flex; gap: 8px; margin-top: 12px; align-items: center; }
button { padding: 4px 12px; font: inherit; cursor: pointer; }
button[disabled] { cursor: not-allowed; opacity: 0.5; }
.danger { color: var(--err); }

.file-listing { width: 100%; border-collapse: collapse; margin: 8px 0; }
.file-listing th, .file-listing td { text-align: left; padding: 4px 8px; border-bottom: 1px solid var(--border); }
.file-listing tr.corrected td:nth-child(2) { color: var(--err); }
.file-listing tr.ok td:nth-child(2) { color: var(--ok); }

pre.json { padding: 8px; border: 1px solid var(--border); overflow-x: auto; }

.metrics { display: flex; gap: 24px; margin: 12px 0; }
.metric { display: flex; flex-direction: column; }
.metric-label { color: var(--text-muted); }
.metric-value { font-size: 24px; }
.metric-delta { color: var(--text-muted); font-size: 12px; }

.charts { display: grid; grid-template-columns: repeat(2, 1fr); gap: 16px; }
.charts .wide { grid-column: span 2; }
figcaption { text-align: center; color: var(--text-muted); }
svg.chart { width: 100%; height: auto; }
svg .axis { stroke: var(--border); }
svg .axis-label, svg .bar-value { fill: var(--text-muted); font-size: 12px; }
svg .bar-success, svg .pie-success { fill: var(--ok); }
svg .bar-corrected, svg .pie-corrected { fill: var(--err); }
svg .pie-empty { fill: none; stroke: var(--border); }
svg .series-line { fill: none; stroke: var(--link); stroke-width: 2; }
svg .series-dot { fill: var(--link); }
"#;
