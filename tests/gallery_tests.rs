mod support;

use photo_gallery::{
    entities::media::GalleryFilters,
    errors::AppError,
    use_cases::gallery::MediaVariant,
};
use support::*;

#[actix_rt::test]
async fn gallery_lists_newest_first_with_metadata() {
    let h = Harness::new().await;
    let owner = h.repo.add_user("marta", true);
    let first = h.repo.add_photo(&owner.id, "first.jpg", None);
    h.repo.add_photo(&owner.id, "second.jpg", Some("Summer"));
    h.repo.tag(&first.id, &["Beach", "family"]);

    let page = h
        .gallery()
        .list(&actor(&owner), None, GalleryFilters::default())
        .await
        .unwrap();

    let names: Vec<_> = page.items.iter().map(|i| i.filename.as_str()).collect();
    assert_eq!(names, vec!["second.jpg", "first.jpg"]);
    assert_eq!(page.items[0].album.as_deref(), Some("Summer"));
    assert_eq!(page.items[1].tags, vec!["Beach", "family"]);
    assert_eq!(page.all_tags, vec!["Beach", "family"]);
    assert_eq!(page.items[0].url, "/uploads/second.jpg");
}

#[actix_rt::test]
async fn stranger_cannot_list_or_fetch() {
    let h = Harness::new().await;
    let owner = h.repo.add_user("marta", true);
    let stranger = h.repo.add_user("eve", true);
    h.repo.add_photo(&owner.id, "private.jpg", None);
    h.place(&owner.id, "private.jpg").await;

    let gallery = h.gallery();
    let err = gallery
        .list(&actor(&stranger), Some(owner.id), GalleryFilters::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ForbiddenAccess));

    let err = gallery
        .resolve_media(&actor(&stranger), Some(owner.id), "private.jpg", MediaVariant::Original)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ForbiddenAccess));
}

#[actix_rt::test]
async fn delegate_views_with_owner_qualified_links() {
    let h = Harness::new().await;
    let owner = h.repo.add_user("marta", true);
    let delegate = h.repo.add_user("oma", true);
    h.repo.add_grant(&owner, &delegate, "Grandma", false, false);
    h.repo.add_photo(&owner.id, "garden.jpg", None);

    let page = h
        .gallery()
        .list(&actor(&delegate), Some(owner.id), GalleryFilters::default())
        .await
        .unwrap();

    assert_eq!(page.owner_id, owner.id);
    assert_eq!(page.items[0].url, format!("/uploads/garden.jpg?owner_id={}", owner.id));

    let delegate_page = h
        .gallery()
        .list(&actor(&delegate), None, GalleryFilters::default())
        .await
        .unwrap();
    assert!(delegate_page.items.is_empty());
    assert_eq!(delegate_page.shared_with_me.len(), 1);
    assert_eq!(delegate_page.shared_with_me[0].counterpart_username, "marta");
}

#[actix_rt::test]
async fn search_covers_album_titles() {
    let h = Harness::new().await;
    let owner = h.repo.add_user("marta", true);
    h.repo.add_photo(&owner.id, "a1.jpg", Some("Summer Lake"));
    h.repo.add_photo(&owner.id, "b2.jpg", Some("Winter"));

    let page = h
        .gallery()
        .list(&actor(&owner), None, GalleryFilters::new(None, Some("LAKE")))
        .await
        .unwrap();

    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].filename, "a1.jpg");
    assert_eq!(page.search_query.as_deref(), Some("lake"));
}

#[actix_rt::test]
async fn tag_and_search_narrow_together() {
    let h = Harness::new().await;
    let owner = h.repo.add_user("marta", true);
    let pine = h.repo.add_photo(&owner.id, "pine.jpg", Some("Forest"));
    let oak = h.repo.add_photo(&owner.id, "oak.jpg", Some("Forest"));
    let shore = h.repo.add_photo(&owner.id, "shore.jpg", None);
    h.repo.tag(&pine.id, &["green"]);
    h.repo.tag(&oak.id, &["brown"]);
    h.repo.tag(&shore.id, &["green"]);

    let page = h
        .gallery()
        .list(&actor(&owner), None, GalleryFilters::new(Some("Green"), Some("forest")))
        .await
        .unwrap();

    let names: Vec<_> = page.items.iter().map(|i| i.filename.as_str()).collect();
    assert_eq!(names, vec!["pine.jpg"]);
    assert_eq!(page.current_tag.as_deref(), Some("green"));
}

#[actix_rt::test]
async fn description_is_trimmed_and_bounded() {
    let h = Harness::new().await;
    let owner = h.repo.add_user("marta", true);
    h.repo.add_photo(&owner.id, "a1.jpg", None);
    let gallery = h.gallery();

    gallery.update_description(&actor(&owner), "a1.jpg", "  Sunset at the pier  ").await.unwrap();
    let page = gallery.list(&actor(&owner), None, GalleryFilters::default()).await.unwrap();
    assert_eq!(page.items[0].description, "Sunset at the pier");

    let err = gallery
        .update_description(&actor(&owner), "a1.jpg", &"x".repeat(2001))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));
}

#[actix_rt::test]
async fn only_the_owner_edits_descriptions() {
    let h = Harness::new().await;
    let owner = h.repo.add_user("marta", true);
    let delegate = h.repo.add_user("oma", true);
    h.repo.add_grant(&owner, &delegate, "Grandma", true, true);
    h.repo.add_photo(&owner.id, "a1.jpg", None);

    let err = h
        .gallery()
        .update_description(&actor(&delegate), "a1.jpg", "mine now")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[actix_rt::test]
async fn deleting_a_photo_removes_row_metadata_and_file() {
    let h = Harness::new().await;
    let owner = h.repo.add_user("marta", true);
    let photo = h.repo.add_photo(&owner.id, "a1.jpg", None);
    h.repo.tag(&photo.id, &["beach"]);
    let path = h.place(&owner.id, "a1.jpg").await;

    h.gallery().delete_photo(&actor(&owner), "a1.jpg").await.unwrap();

    assert!(h.repo.photos_of(&owner.id).is_empty());
    assert_eq!(h.repo.metadata_rows(), 0);
    assert!(!path.exists());

    let err = h.gallery().delete_photo(&actor(&owner), "a1.jpg").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[actix_rt::test]
async fn traversal_names_are_rejected() {
    let h = Harness::new().await;
    let owner = h.repo.add_user("marta", true);

    let err = h
        .gallery()
        .resolve_media(&actor(&owner), None, "../secrets.txt", MediaVariant::Original)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
}

#[actix_rt::test]
async fn media_resolves_inside_the_owner_directory() {
    let h = Harness::new().await;
    let owner = h.repo.add_user("marta", true);
    let delegate = h.repo.add_user("oma", true);
    h.repo.add_grant(&owner, &delegate, "Grandma", false, false);
    h.repo.add_photo(&owner.id, "a1.jpg", None);
    let path = h.place(&owner.id, "a1.jpg").await;

    let file = h
        .gallery()
        .resolve_media(&actor(&delegate), Some(owner.id), "a1.jpg", MediaVariant::Original)
        .await
        .unwrap();
    assert_eq!(file.path, path);
    assert_eq!(file.download_name, "a1.jpg");

    let err = h
        .gallery()
        .resolve_media(&actor(&owner), None, "a1.jpg", MediaVariant::Thumbnail)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
