//! Open/close protocol for hosts that render the asset tag body repeatedly.
//!
//! The host calls [`AssetBuilder::open_tag`] once per tag, renders the tag body with the
//! published `asset_url`, then calls [`AssetTag::close`] with the rendered body. In debug
//! mode `close` publishes the next URL and asks for another pass until every artifact has
//! been rendered.

use crate::builder::{AssetBuilder, BuildReport};
use crate::error::Result;
use crate::iterator::DebugIterator;
use crate::models::OutputMode;
use crate::selection::{AssetRequest, TagParams};

/// Result of closing one pass of the tag body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagClose {
  /// Rendered body of the pass that just finished.
  pub content: Option<String>,
  /// Whether the host must render the body again with the new `asset_url`.
  pub repeat: bool,
}

/// Per-tag state threaded between the open call and every close call.
#[derive(Debug)]
pub struct AssetTag {
  mode: OutputMode,
  asset_url: Option<String>,
  iterator: DebugIterator,
  report: BuildReport,
}

impl AssetTag {
  /// URL to render in the current pass.
  pub fn asset_url(&self) -> Option<&str> {
    self.asset_url.as_deref()
  }

  /// Artifacts written when the tag was opened.
  pub fn report(&self) -> &BuildReport {
    &self.report
  }

  /// Finish a pass. Debug tags advance to the next artifact URL.
  pub fn close(&mut self, content: Option<String>) -> TagClose {
    if content.is_none() || !self.mode.is_debug() {
      return TagClose {
        content,
        repeat: false,
      };
    }

    let pull = self.iterator.pull();
    if let Some(url) = pull.url {
      self.asset_url = Some(url);
    }
    TagClose {
      content,
      repeat: pull.more,
    }
  }
}

impl AssetBuilder<'_> {
  /// Resolve and write the tag's request and publish its first URL.
  pub fn open_tag(&mut self, params: &TagParams) -> Result<AssetTag> {
    let request = AssetRequest::try_from(params)?;
    let report = self.build(&request)?;

    let mut iterator = DebugIterator::new();
    let asset_url = match request.mode {
      OutputMode::Debug => iterator.start(report.urls()).map(str::to_string),
      OutputMode::Production => report.urls().into_iter().next(),
    };

    Ok(AssetTag {
      mode: request.mode,
      asset_url,
      iterator,
      report,
    })
  }

  /// Drive a tag to completion, rendering `body` once per published URL.
  pub fn render_tag<F>(&mut self, params: &TagParams, mut body: F) -> Result<String>
  where
    F: FnMut(&str) -> String,
  {
    let mut tag = self.open_tag(params)?;
    let mut rendered = String::new();

    while let Some(url) = tag.asset_url().map(str::to_string) {
      let close = tag.close(Some(body(&url)));
      if let Some(content) = close.content {
        rendered.push_str(&content);
      }
      if !close.repeat {
        break;
      }
    }

    Ok(rendered)
  }
}
