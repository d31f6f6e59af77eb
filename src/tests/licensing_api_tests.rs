#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};

    use crate::tests::{agent_auth, host_payload, send, send_json, test_app, user_auth};

    fn enterprise_edition() -> Value {
        json!({
            "id": "A90611",
            "itemDescription": "Oracle Database Enterprise Edition",
            "metric": "Processor Perpetual",
            "cost": 47500.0,
            "aliases": ["Oracle ENT"],
            "option": false
        })
    }

    #[tokio::test]
    async fn test_license_type_crud() {
        let (app, _) = test_app().await;
        let auth = user_auth();

        let (status, created) = send_json(&app, Method::POST, "/licenses/types", Some(&auth), Some(enterprise_edition())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["id"], "A90611");

        let (status, body) = send_json(&app, Method::POST, "/licenses/types", Some(&auth), Some(enterprise_edition())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");

        let mut changed = enterprise_edition();
        changed["cost"] = json!(50000.0);
        let (status, updated) = send_json(&app, Method::PUT, "/licenses/types/A90611", Some(&auth), Some(changed)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["cost"], 50000.0);

        let (_, listed) = send_json(&app, Method::GET, "/licenses/types", Some(&auth), None).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let (status, _) = send(&app, Method::DELETE, "/licenses/types/A90611", Some(&auth), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, Method::GET, "/licenses/types/A90611", Some(&auth), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_agreement_requires_known_license_type() {
        let (app, _) = test_app().await;
        let agreement = json!({ "agreementID": "AID001", "licenseTypeID": "A90611", "count": 10.0, "hosts": ["srv1"] });

        let (status, body) =
            send_json(&app, Method::POST, "/licenses/agreements/oracle/database", Some(&user_auth()), Some(agreement.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["details"]["field"], "licenseTypeID");

        send(&app, Method::POST, "/licenses/types", Some(&user_auth()), Some(enterprise_edition())).await;
        let (status, created) =
            send_json(&app, Method::POST, "/licenses/agreements/oracle/database", Some(&user_auth()), Some(agreement)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(!created["id"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_oracle_compliance_and_history() {
        let (app, state) = test_app().await;
        let auth = user_auth();

        send(&app, Method::POST, "/licenses/types", Some(&auth), Some(enterprise_edition())).await;
        send(
            &app,
            Method::POST,
            "/licenses/agreements/oracle/database",
            Some(&auth),
            Some(json!({ "agreementID": "AID001", "licenseTypeID": "A90611", "count": 3.0, "hosts": ["srv1"] })),
        )
        .await;
        for payload in [host_payload("srv1", "Italy", 4, "19.0.0.0.0", 2.0), host_payload("srv2", "Italy", 4, "19.0.0.0.0", 4.0)] {
            send(&app, Method::POST, "/data/hosts", Some(&agent_auth()), Some(payload)).await;
        }

        let (status, compliance) = send_json(&app, Method::GET, "/licenses/compliance", Some(&auth), None).await;
        assert_eq!(status, StatusCode::OK);
        let ee = &compliance[0];
        assert_eq!(ee["licenseTypeID"], "A90611");
        assert_eq!(ee["itemDescription"], "Oracle Database Enterprise Edition");
        assert_eq!(ee["consumed"], 6.0);
        assert_eq!(ee["covered"], 2.0);
        assert_eq!(ee["purchased"], 3.0);
        assert_eq!(ee["available"], 1.0);
        assert_eq!(ee["unlimited"], false);

        let (status, stored) = send_json(&app, Method::POST, "/licenses/compliance/historicize", Some(&auth), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stored["stored"], 1);
        // A second run on the same day overwrites the first.
        send(&app, Method::POST, "/licenses/compliance/historicize", Some(&auth), None).await;
        assert_eq!(state.metrics.get_snapshot().historicizations, 2);

        let (status, history) = send_json(&app, Method::GET, "/charts/licenses/compliance/history", Some(&auth), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(history.as_array().unwrap().len(), 1);
        assert_eq!(history[0]["itemDescription"], "Oracle Database Enterprise Edition");
        assert_eq!(history[0]["history"].as_array().unwrap().len(), 1);
        assert_eq!(history[0]["history"][0]["consumed"], 6.0);
    }

    #[tokio::test]
    async fn test_license_names_resolve_through_aliases() {
        let (app, _) = test_app().await;
        let auth = user_auth();
        send(&app, Method::POST, "/licenses/types", Some(&auth), Some(enterprise_edition())).await;

        let mut payload = host_payload("srv1", "Italy", 4, "19.0.0.0.0", 2.0);
        payload["features"]["oracle"]["database"]["databases"][0]["licenses"] =
            json!([{ "licenseTypeID": "", "name": "Oracle ENT", "count": 2.0 }, { "licenseTypeID": "", "name": "Diagnostics Pack", "count": 2.0 }]);
        let (status, _) = send(&app, Method::POST, "/data/hosts", Some(&agent_auth()), Some(payload)).await;
        assert_eq!(status, StatusCode::OK);

        let (_, host) = send_json(&app, Method::GET, "/hosts/srv1", Some(&auth), None).await;
        let licenses = &host["features"]["oracle"]["database"]["databases"][0]["licenses"];
        assert_eq!(licenses[0]["licenseTypeID"], "A90611");
        assert_eq!(licenses[1]["licenseTypeID"], "");

        let (_, compliance) = send_json(&app, Method::GET, "/licenses/compliance", Some(&auth), None).await;
        let compliance = compliance.as_array().unwrap();
        assert_eq!(compliance.len(), 1);
        assert_eq!(compliance[0]["licenseTypeID"], "A90611");
        assert_eq!(compliance[0]["consumed"], 2.0);
    }

    #[tokio::test]
    async fn test_mysql_contract_validation() {
        let (app, _) = test_app().await;
        let (status, body) = send_json(
            &app,
            Method::POST,
            "/licenses/contracts/mysql",
            Some(&user_auth()),
            Some(json!({ "contractID": "c1", "type": "SITE", "numberOfLicenses": 2 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["details"]["field"], "type");

        let (status, created) = send_json(
            &app,
            Method::POST,
            "/licenses/contracts/mysql",
            Some(&user_auth()),
            Some(json!({ "contractID": "c1", "type": "HOST", "numberOfLicenses": 2, "hosts": ["srv1"] })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();

        let (status, _) = send(&app, Method::DELETE, &format!("/licenses/contracts/mysql/{}", id), Some(&user_auth()), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, listed) = send_json(&app, Method::GET, "/licenses/contracts/mysql", Some(&user_auth()), None).await;
        assert!(listed.as_array().unwrap().is_empty());
    }
}
