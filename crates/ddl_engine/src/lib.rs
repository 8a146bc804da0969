//! Harvester engine: page loading, link extraction and resolution, queue storage.
mod clipboard;
mod decode;
mod engine;
mod harvest;
mod http;
mod page;
mod persist;
mod postprocess;
mod resolve;
mod rules;
mod store;
mod types;

pub use clipboard::{
    ClipboardError, ClipboardWriter, CommandClipboard, FallbackClipboard, FileClipboard,
};
pub use decode::{decode_text, decode_text_lossy, DecodeError, DecodedText};
pub use engine::{EngineEvent, EngineHandle, EngineSetup};
pub use harvest::{HarvestError, HarvestOptions, HarvestReport, Harvester};
pub use http::{HttpClient, HttpSettings, ReqwestHttpClient};
pub use page::{load_page, Page, PageError, PageSource};
pub use persist::{AtomicFileWriter, PersistError};
pub use postprocess::{
    DocumentViewerTransform, LinkTransform, PostProcessRule, PostProcessor, TransformError,
};
pub use resolve::{
    build_request, merge_headers, parse_ajax_json, parse_meta_refresh, parse_redirect_follower,
    parse_redirector, resolve_candidate, unescape_slashes,
};
pub use rules::{
    default_rules, Candidate, ExtractionRule, Extractor, RequestSpec, ResponseParser, RuleError,
    RuleMatch, RuleTable, UrlSpec, FIRST_PARTY_REDIRECTOR_HOSTS,
};
pub use store::{
    FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, QueueStore, StoreError, QUEUE_KEY,
};
pub use types::{FailureKind, FetchError, HttpRequest, HttpResponse, Method};
