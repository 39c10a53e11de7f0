use axum::response::Html;

const INDEX_PAGE: &str = r#"<h1>Sign Language Prediction API</h1>
<p>API is running successfully.</p>
<p>Go to <a href="/upload">/upload</a> to test image upload.</p>
"#;

const UPLOAD_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>Test Sign Language Prediction</title>
</head>
<body>
    <h2>Upload an Image for Prediction</h2>
    <form action="/predict" method="post" enctype="multipart/form-data">
        <input type="file" name="file" required>
        <br><br>
        <input type="submit" value="Predict">
    </form>
</body>
</html>
"#;

pub async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

pub async fn upload_form() -> Html<&'static str> {
    Html(UPLOAD_PAGE)
}
