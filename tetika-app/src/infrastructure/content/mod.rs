mod dom;
mod normalizer;

pub use dom::{DomNode, DomTree, HtmlPage};
pub use normalizer::{
    clean_text, extract_main_content, host_of, is_same_site, is_skippable_href, normalize_url,
    MainContent,
};
