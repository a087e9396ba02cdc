use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Snapshot of a page as the content relay sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDocument {
    pub url: String,
    pub html: String,
}

impl PageDocument {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }
}

pub trait VideoDetector: Send + Sync {
    /// Best-effort lookup of a playable video. Absence is a normal result.
    fn detect(&self, page: &PageDocument) -> Option<String>;
}

/// DOM-based detection, in order of preference:
/// - the first `<video>` with a usable `src` or `<source src>`
/// - the page itself when it is a known platform watch page
/// - an embedded platform player `<iframe>`
/// - `og:video` meta tags.
#[derive(Debug, Default, Clone, Copy)]
pub struct DomVideoDetector;

impl VideoDetector for DomVideoDetector {
    fn detect(&self, page: &PageDocument) -> Option<String> {
        let doc = Html::parse_document(&page.html);
        let base = Url::parse(&page.url).ok();

        media_element_source(&doc, base.as_ref())
            .or_else(|| base.as_ref().and_then(platform_watch_url))
            .or_else(|| embedded_player(&doc, base.as_ref()))
            .or_else(|| meta_video(&doc, base.as_ref()))
    }
}

fn media_element_source(doc: &Html, base: Option<&Url>) -> Option<String> {
    let video_sel = Selector::parse("video").ok()?;
    let source_sel = Selector::parse("source[src]").ok()?;

    doc.select(&video_sel).find_map(|video| {
        attr_url(video, "src", base).or_else(|| {
            video
                .select(&source_sel)
                .find_map(|source| attr_url(source, "src", base))
        })
    })
}

fn platform_watch_url(page: &Url) -> Option<String> {
    let host = page.host_str()?.trim_start_matches("www.").trim_start_matches("m.");
    let path = page.path();
    let is_watch_page = match host {
        "youtube.com" => {
            (path == "/watch" && page.query_pairs().any(|(key, value)| key == "v" && !value.is_empty()))
                || path.strip_prefix("/shorts/").is_some_and(|id| !id.is_empty())
        }
        "youtu.be" => path.len() > 1,
        "vimeo.com" => path
            .trim_start_matches('/')
            .split('/')
            .next()
            .is_some_and(|segment| !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())),
        _ => false,
    };
    is_watch_page.then(|| page.to_string())
}

fn embedded_player(doc: &Html, base: Option<&Url>) -> Option<String> {
    let iframe_sel = Selector::parse("iframe[src]").ok()?;
    doc.select(&iframe_sel)
        .filter_map(|iframe| attr_url(iframe, "src", base))
        .find(|src| {
            Url::parse(src).is_ok_and(|url| {
                let host = url.host_str().unwrap_or_default();
                let youtube_embed = (is_host_or_subdomain(host, "youtube.com")
                    || is_host_or_subdomain(host, "youtube-nocookie.com"))
                    && url.path().starts_with("/embed/");
                youtube_embed || host == "player.vimeo.com"
            })
        })
}

fn is_host_or_subdomain(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

fn meta_video(doc: &Html, base: Option<&Url>) -> Option<String> {
    let meta_sel =
        Selector::parse(r#"meta[property="og:video"], meta[property="og:video:url"]"#).ok()?;
    doc.select(&meta_sel)
        .find_map(|meta| attr_url(meta, "content", base))
}

/// Reads `attr` as an absolute URL, resolving relative values against `base`.
/// Blob and data URLs are skipped since they are useless outside the page.
fn attr_url(element: ElementRef<'_>, attr: &str, base: Option<&Url>) -> Option<String> {
    let raw = element.value().attr(attr)?.trim();
    if raw.is_empty() || raw.starts_with("blob:") || raw.starts_with("data:") {
        return None;
    }
    let resolved = match base {
        Some(base) => base.join(raw).ok()?,
        None => Url::parse(raw).ok()?,
    };
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}
