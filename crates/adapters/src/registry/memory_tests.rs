// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn resolves_normalized_paths() {
    let registry =
        StaticRouteRegistry::from_routes([Route::new("myapp", "/hello/", "echo hi")]).unwrap();

    let route = registry.resolve_route("myapp", "hello").await.unwrap();
    assert_eq!(route.path, "/hello");
    assert_eq!(route.image, "echo hi");
}

#[tokio::test]
async fn unknown_app_and_route_are_distinct() {
    let registry =
        StaticRouteRegistry::from_routes([Route::new("myapp", "/hello", "echo hi")]).unwrap();

    assert_eq!(
        registry.resolve_route("other", "/hello").await,
        Err(RegistryError::AppNotFound("other".to_string()))
    );
    assert_eq!(
        registry.resolve_route("myapp", "/missing").await,
        Err(RegistryError::RouteNotFound {
            app: "myapp".to_string(),
            path: "/missing".to_string(),
        })
    );
}

#[test]
fn invalid_routes_are_rejected() {
    let result = StaticRouteRegistry::from_routes([Route::new("myapp", "/t", "x").with_timeout(0)]);
    assert!(matches!(result, Err(RouteError::InvalidTimeout { .. })));
}

#[tokio::test]
async fn insert_replaces_and_remove_drops_empty_apps() {
    let registry = StaticRouteRegistry::new();
    registry.insert(Route::new("myapp", "/a", "v1")).unwrap();
    registry.insert(Route::new("myapp", "/a", "v2")).unwrap();
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.resolve_route("myapp", "/a").await.unwrap().image, "v2");

    assert!(registry.remove("myapp", "a").is_some());
    assert!(registry.is_empty());
    assert!(matches!(
        registry.resolve_route("myapp", "/a").await,
        Err(RegistryError::AppNotFound(_))
    ));
}
