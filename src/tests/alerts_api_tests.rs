#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};

    use crate::jobs;
    use crate::tests::{agent_auth, host_payload, send, send_json, test_app, user_auth};

    async fn upload(app: &axum::Router, payload: Value) {
        let (status, _) = send(app, Method::POST, "/data/hosts", Some(&agent_auth()), Some(payload)).await;
        assert_eq!(status, StatusCode::OK);
    }

    async fn alerts(app: &axum::Router, query: &str) -> Vec<Value> {
        let (status, body) = send_json(app, Method::GET, &format!("/alerts{}", query), Some(&user_auth()), None).await;
        assert_eq!(status, StatusCode::OK);
        body.as_array().cloned().unwrap_or_default()
    }

    fn codes(alerts: &[Value]) -> Vec<&str> {
        let mut codes: Vec<&str> = alerts.iter().filter_map(|a| a["alertCode"].as_str()).collect();
        codes.sort_unstable();
        codes
    }

    #[tokio::test]
    async fn test_first_upload_raises_server_database_and_license_alerts() {
        let (app, state) = test_app().await;
        send(
            &app,
            Method::POST,
            "/licenses/types",
            Some(&user_auth()),
            Some(json!({ "id": "A90611", "itemDescription": "Oracle Database Enterprise Edition", "metric": "Processor Perpetual" })),
        )
        .await;
        upload(&app, host_payload("srv1", "Italy", 4, "19.0.0.0.0", 2.0)).await;

        let raised = alerts(&app, "").await;
        assert_eq!(codes(&raised), ["NEW_DATABASE", "NEW_LICENSE", "NEW_SERVER"]);
        let license = raised.iter().find(|a| a["alertCode"] == "NEW_LICENSE").unwrap();
        assert_eq!(license["alertSeverity"], "CRITICAL");
        assert_eq!(license["alertCategory"], "LICENSE");
        assert_eq!(license["otherInfo"]["hostname"], "srv1");
        assert_eq!(license["otherInfo"]["dbname"], "ERCOLE");
        assert_eq!(state.metrics.get_snapshot().alerts_raised, 3);

        // Same content again: nothing new.
        upload(&app, host_payload("srv1", "Italy", 4, "19.0.0.0.0", 2.0)).await;
        assert_eq!(alerts(&app, "").await.len(), 3);
    }

    #[tokio::test]
    async fn test_missing_database_is_acknowledged_when_it_comes_back() {
        let (app, _) = test_app().await;
        upload(&app, host_payload("srv1", "Italy", 4, "19.0.0.0.0", 2.0)).await;

        let mut without_db = host_payload("srv1", "Italy", 4, "19.0.0.0.0", 2.0);
        without_db["features"]["oracle"]["database"]["databases"] = json!([]);
        upload(&app, without_db).await;

        let missing = alerts(&app, "?code=MISSING_DATABASE").await;
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0]["alertSeverity"], "CRITICAL");
        assert_eq!(missing[0]["alertStatus"], "NEW");
        assert_eq!(missing[0]["otherInfo"]["dbNames"], json!(["ERCOLE"]));

        upload(&app, host_payload("srv1", "Italy", 4, "19.0.0.0.0", 2.0)).await;
        let missing = alerts(&app, "?code=MISSING_DATABASE").await;
        assert_eq!(missing[0]["alertStatus"], "ACK");
        // The database reappearing is reported as new again.
        assert_eq!(alerts(&app, "?code=NEW_DATABASE&status=NEW").await.len(), 2);
    }

    #[tokio::test]
    async fn test_agent_errors_raise_an_alert() {
        let (app, _) = test_app().await;
        let mut payload = host_payload("srv1", "Italy", 4, "19.0.0.0.0", 2.0);
        payload["errors"] = json!([{ "message": "cannot read oratab" }]);
        upload(&app, payload).await;

        let errors = alerts(&app, "?code=AGENT_ERROR&severity=CRITICAL").await;
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0]["description"], "cannot read oratab\n");
        assert_eq!(errors[0]["alertCategory"], "ENGINE");
    }

    #[tokio::test]
    async fn test_acknowledge_alerts() {
        let (app, _) = test_app().await;
        upload(&app, host_payload("srv1", "Italy", 4, "19.0.0.0.0", 2.0)).await;
        upload(&app, host_payload("srv2", "Italy", 4, "19.0.0.0.0", 2.0)).await;

        let (status, _) = send(&app, Method::GET, "/alerts", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let server = alerts(&app, "?code=NEW_SERVER&hostname=srv1").await;
        assert_eq!(server.len(), 1);
        let id = server[0]["id"].as_str().unwrap().to_string();
        let (status, _) = send(&app, Method::POST, &format!("/alerts/{}/ack", id), Some(&user_auth()), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(alerts(&app, "?code=NEW_SERVER&hostname=srv1").await[0]["alertStatus"], "ACK");

        let (status, _) = send(&app, Method::POST, "/alerts/unknown/ack", Some(&user_auth()), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let open: Vec<Value> = alerts(&app, "?status=NEW").await;
        assert_eq!(open.len(), 3);
        let mut ids: Vec<Value> = open.iter().map(|a| a["id"].clone()).collect();
        ids.push(json!("unknown"));
        let (status, body) = send_json(&app, Method::POST, "/alerts/ack", Some(&user_auth()), Some(json!({ "ids": ids }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["acknowledged"], 3);
        assert!(alerts(&app, "?status=NEW").await.is_empty());

        let (status, body) = send_json(&app, Method::POST, "/alerts/ack", Some(&user_auth()), Some(json!({ "ids": [] }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["details"]["field"], "ids");
    }

    #[tokio::test]
    async fn test_bad_alert_filters_are_rejected() {
        let (app, _) = test_app().await;
        let (status, _) = send(&app, Method::GET, "/alerts?severity=MAJOR", Some(&user_auth()), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&app, Method::GET, "/alerts?from=yesterday", Some(&user_auth()), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_freshness_check_raises_no_data_once() {
        let (app, state) = test_app().await;
        upload(&app, host_payload("srv1", "Italy", 4, "19.0.0.0.0", 2.0)).await;
        let days = state.config.alert_service.freshness_check_days;

        assert_eq!(jobs::check_freshness_once(&state, Utc::now()).await.unwrap(), 0);
        let later = Utc::now() + Duration::days(days + 2);
        assert_eq!(jobs::check_freshness_once(&state, later).await.unwrap(), 1);
        // A second run replaces the open alert instead of adding one.
        assert_eq!(jobs::check_freshness_once(&state, later).await.unwrap(), 1);

        let no_data = alerts(&app, "?code=NO_DATA").await;
        assert_eq!(no_data.len(), 1);
        assert_eq!(no_data[0]["alertCategory"], "AGENT");
        assert_eq!(no_data[0]["alertSeverity"], "CRITICAL");
        assert!(no_data[0]["description"].as_str().unwrap().contains(&format!("in the last {} day(s)", days + 2)));

        // Acknowledged staleness is not reported again.
        let id = no_data[0]["id"].as_str().unwrap().to_string();
        send(&app, Method::POST, &format!("/alerts/{}/ack", id), Some(&user_auth()), None).await;
        assert_eq!(jobs::check_freshness_once(&state, later).await.unwrap(), 0);
        assert_eq!(alerts(&app, "?code=NO_DATA&status=NEW").await.len(), 0);
    }

    #[tokio::test]
    async fn test_new_snapshot_acknowledges_no_data() {
        let (app, state) = test_app().await;
        upload(&app, host_payload("srv1", "Italy", 4, "19.0.0.0.0", 2.0)).await;
        let later = Utc::now() + Duration::days(state.config.alert_service.freshness_check_days + 1);
        jobs::check_freshness_once(&state, later).await.unwrap();
        assert_eq!(alerts(&app, "?code=NO_DATA&status=NEW").await.len(), 1);

        upload(&app, host_payload("srv1", "Italy", 4, "19.0.0.0.0", 2.0)).await;
        assert_eq!(alerts(&app, "?code=NO_DATA&status=NEW").await.len(), 0);
        assert_eq!(alerts(&app, "?code=NO_DATA&status=ACK").await.len(), 1);
    }
}
