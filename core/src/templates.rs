use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Template {
    BasicArticle,
    ArticleWithImage,
    ArticleWithTable,
    MeetingNotes,
    Report,
}

impl Template {
    pub const ALL: [Template; 5] = [
        Template::BasicArticle,
        Template::ArticleWithImage,
        Template::ArticleWithTable,
        Template::MeetingNotes,
        Template::Report,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Template::BasicArticle => "Basic article",
            Template::ArticleWithImage => "Article with image",
            Template::ArticleWithTable => "Article with table",
            Template::MeetingNotes => "Meeting notes",
            Template::Report => "Report",
        }
    }

    pub fn html(&self) -> &'static str {
        match self {
            Template::BasicArticle => {
                "<h1>Article title</h1>\
<p>Write a short introduction that tells readers what this post is about.</p>\
<h2>Main point</h2>\
<p>Develop your first idea here. Use <strong>bold</strong> and <em>italic</em> text for emphasis.</p>\
<h2>Conclusion</h2>\
<p>Wrap up and give readers something to take away.</p>"
            }
            Template::ArticleWithImage => {
                "<h1>Article title</h1>\
<p>Introduce the topic before the image.</p>\
<p><img src=\"https://placehold.co/800x400\" alt=\"Cover image\"></p>\
<p>Describe what the image shows and why it matters.</p>\
<blockquote><p>Add a memorable quote here.</p></blockquote>"
            }
            Template::ArticleWithTable => {
                "<h1>Comparison</h1>\
<p>Summarize what is being compared.</p>\
<table><tbody>\
<tr><th><p>Option</p></th><th><p>Pros</p></th><th><p>Cons</p></th></tr>\
<tr><td><p>First</p></td><td><p>Fast</p></td><td><p>Expensive</p></td></tr>\
<tr><td><p>Second</p></td><td><p>Cheap</p></td><td><p>Slow</p></td></tr>\
</tbody></table>\
<p>State your recommendation.</p>"
            }
            Template::MeetingNotes => {
                "<h1>Meeting notes</h1>\
<p><strong>Date:</strong> </p>\
<p><strong>Attendees:</strong> </p>\
<h2>Agenda</h2>\
<ol><li><p>Review last week</p></li><li><p>Open issues</p></li></ol>\
<h2>Action items</h2>\
<ul data-type=\"taskList\">\
<li data-type=\"taskItem\" data-checked=\"false\"><p>Send summary</p></li>\
<li data-type=\"taskItem\" data-checked=\"false\"><p>Schedule follow-up</p></li>\
</ul>"
            }
            Template::Report => {
                "<h1>Monthly report</h1>\
<h2>Summary</h2>\
<p>Highlights of the period.</p>\
<h2>Metrics</h2>\
<table><tbody>\
<tr><th><p>Metric</p></th><th><p>Target</p></th><th><p>Actual</p></th></tr>\
<tr><td><p>Visitors</p></td><td><p>10,000</p></td><td><p></p></td></tr>\
<tr><td><p>Signups</p></td><td><p>500</p></td><td><p></p></td></tr>\
</tbody></table>\
<h2>Next steps</h2>\
<ul><li><p>First step</p></li></ul>"
            }
        }
    }
}
