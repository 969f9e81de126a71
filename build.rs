use std::env;

fn main() {
    // キャッシュバケットのバージョン（voltix-audit-<version>）
    let version = env::var("VOLTIX_CACHE_VERSION").unwrap_or_else(|_| "v1".to_string());
    if version.is_empty() || version.chars().any(char::is_whitespace) {
        panic!("VOLTIX_CACHE_VERSION must be a non-empty token, got {:?}", version);
    }
    println!("cargo:warning=VOLTIX_CACHE_VERSION set to {}", version);
    println!("cargo:rustc-env=VOLTIX_CACHE_VERSION={}", version);

    // 環境変数変更時に再ビルド
    println!("cargo:rerun-if-env-changed=VOLTIX_CACHE_VERSION");
}
