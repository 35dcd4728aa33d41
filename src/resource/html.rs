// src/resource/html.rs
// =============================================================================
// This module finds same-site links in an HTML page and rewrites them to
// local paths, so the saved copy can be browsed offline.
//
// We use the `lol_html` crate which:
// - Tokenizes HTML as a stream (no recursion, no DOM to build)
// - Calls our handler for every element matching a CSS selector
// - Passes every byte we don't touch straight through to the output
//
// Only attribute values are ever rewritten. Text that happens to look like a
// link is left alone, which a search-and-replace over the raw bytes could not
// promise.
//
// Rust concepts:
// - Closures: One handler per (tag, attribute) pair
// - RefCell: Several handlers push into the same link list
// =============================================================================

use std::cell::RefCell;

use lol_html::html_content::Element;
use lol_html::{element, HandlerResult, HtmlRewriter, Settings};
use url::{Host, Url};

use super::path::local_link;

// Result of scanning one page
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Same-site links in document order (duplicates included)
    pub links: Vec<Url>,
    /// The page with every accepted link rewritten to a local path
    pub body: Vec<u8>,
}

// Extracts same-site links from `html` and rewrites them in place
//
// Parameters:
//   html: the raw page bytes
//   page_url: the URL the page was fetched from (base for relative links)
//
// A link is kept when its registrable domain matches the page's, so a page on
// www.example.com keeps links to cdn.example.com. Off-site links, and links
// whose domain can't be determined (mailto:, javascript:, ...), are left as
// they are and not returned.
//
// This never fails: if the rewriter errors, we return no links and the
// original bytes.
pub fn extract_links(html: &[u8], page_url: &Url) -> Extraction {
    match rewrite_links(html, page_url) {
        Ok(extraction) => extraction,
        Err(e) => {
            tracing::debug!(url = %page_url, error = %e, "HTML rewrite failed, keeping original page");
            Extraction {
                links: Vec::new(),
                body: html.to_vec(),
            }
        }
    }
}

fn rewrite_links(html: &[u8], page_url: &Url) -> Result<Extraction, lol_html::errors::RewritingError> {
    let page_domain = registrable_domain(page_url);
    let site = page_domain.as_deref();
    let links = RefCell::new(Vec::new());
    let mut output = Vec::with_capacity(html.len());

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![
                element!("a[href]", |el| rewrite_attribute(el, "href", page_url, site, &links)),
                element!("link[href]", |el| rewrite_attribute(el, "href", page_url, site, &links)),
                element!("img[src]", |el| rewrite_attribute(el, "src", page_url, site, &links)),
                element!("script[src]", |el| rewrite_attribute(el, "src", page_url, site, &links)),
            ],
            // Strict mode gives up on markup like <select><style>, which
            // browsers render fine
            strict: false,
            ..Settings::default()
        },
        |chunk: &[u8]| output.extend_from_slice(chunk),
    );

    rewriter.write(html)?;
    rewriter.end()?;

    Ok(Extraction {
        links: links.into_inner(),
        body: output,
    })
}

// Handles one link-bearing attribute on one element
fn rewrite_attribute(
    el: &mut Element,
    attribute: &str,
    page_url: &Url,
    page_domain: Option<&str>,
    links: &RefCell<Vec<Url>>,
) -> HandlerResult {
    let Some(raw) = el.get_attribute(attribute) else {
        return Ok(());
    };

    let value = html_escape::decode_html_entities(raw.trim());
    let Ok(link) = page_url.join(&value) else {
        return Ok(());
    };

    let same_site = match (page_domain, registrable_domain(&link)) {
        (Some(page), Some(target)) => page == target,
        _ => false,
    };
    if !same_site {
        return Ok(());
    }

    // lol_html only escapes quotes, so a literal '&' in the path has to be
    // written as &amp; or the browser would decode it
    let target = local_link(&link);
    el.set_attribute(attribute, &html_escape::encode_double_quoted_attribute(&target))?;
    links.borrow_mut().push(link);

    Ok(())
}

/// Registrable domain (public suffix plus one label) of a URL's host.
///
/// Example:
///   https://www.example.com/   -> Some("example.com")
///   https://blog.example.co.uk -> Some("example.co.uk")
///   http://127.0.0.1:8080/     -> Some("127.0.0.1")
///   http://localhost/          -> None
///   mailto:someone@example.com -> None
///
/// IP addresses have no public suffix, so the address itself is the site.
pub fn registrable_domain(url: &Url) -> Option<String> {
    match url.host()? {
        Host::Domain(domain) => psl::domain_str(domain).map(str::to_string),
        Host::Ipv4(ip) => Some(ip.to_string()),
        Host::Ipv6(ip) => Some(ip.to_string()),
    }
}
