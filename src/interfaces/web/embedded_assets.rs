use rust_embed::Embed;

/// タイルビューアの静的アセットを埋め込む
#[derive(Embed)]
#[folder = "web/"]
#[include = "*"]
#[include = "**/*"]
pub struct WebAssets;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_assets_available() {
        let index = WebAssets::get("index.html");
        assert!(index.is_some());
    }
}
